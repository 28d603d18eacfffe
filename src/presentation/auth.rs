use crate::domain::user::{CreateUser, LoginRequest, RefreshRequest, UpdateUser};
use crate::presentation::handlers::{ApiError, AppState};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{error, info, instrument};

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Serialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

impl From<crate::domain::user::User> for UserResponse {
    fn from(user: crate::domain::user::User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<CreateUser>,
) -> Result<HttpResponse, ApiError> {
    info!("Registration request received");

    let user = state.auth.register_user(req.into_inner()).await.map_err(|e| {
        error!(error = %e, "Failed to register user");
        ApiError::from(e)
    })?;

    info!(user_id = %user.id, "User registered successfully");
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn token(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Token request received");

    let pair = state.auth.login(req.into_inner()).await.map_err(|e| {
        error!(error = %e, "Failed to issue tokens");
        ApiError::from(e)
    })?;

    info!("Token pair issued");
    Ok(HttpResponse::Ok().json(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
    }))
}

#[instrument(skip_all)]
pub async fn refresh_token(
    state: web::Data<AppState>,
    req: web::Json<RefreshRequest>,
) -> Result<HttpResponse, ApiError> {
    let access = state.auth.refresh(&req.refresh).await.map_err(ApiError::from)?;

    info!("Access token refreshed");
    Ok(HttpResponse::Ok().json(AccessTokenResponse { access }))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let profile = state.auth.get_user(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(profile)))
}

#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn update_me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<UpdateUser>,
) -> Result<HttpResponse, ApiError> {
    let profile = state
        .auth
        .update_user(&user.user_id, req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to update profile");
            ApiError::from(e)
        })?;

    info!(user_id = %profile.id, "Profile updated");
    Ok(HttpResponse::Ok().json(UserResponse::from(profile)))
}
