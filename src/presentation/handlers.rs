use crate::application::auth_service::AuthService;
use crate::application::recipe_service::RecipeService;
use crate::data::image_store::FsImageStore;
use crate::data::memory::InMemoryCatalog;
use crate::data::user_repository::InMemoryUserRepository;
use crate::domain::error::DomainError;
use crate::domain::models::{CreateRecipe, NameRef, UpdateRecipe};
use crate::presentation::middleware::AuthenticatedUser;
use actix_multipart::Multipart;
use actix_web::{FromRequest, HttpMessage, HttpResponse, ResponseError, web};
use chrono::Utc;
use futures_util::TryStreamExt;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

// AppState holding the services
pub struct AppState {
    pub recipes: RecipeService<InMemoryCatalog, FsImageStore>,
    pub auth: Arc<AuthService<InMemoryUserRepository>>,
}

// Uniform error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: serde_json::Value,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            ApiError::Validation(_) => actix_web::http::StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => actix_web::http::StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => actix_web::http::StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        let details = match self {
            ApiError::Validation(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Internal(msg) => serde_json::json!({ "message": msg }),
        };

        // Log error based on severity
        match self {
            ApiError::Validation(_) => {
                warn!(error = %error_msg, status = %status, "Validation error")
            }
            ApiError::NotFound(_) => {
                warn!(error = %error_msg, status = %status, "Resource not found")
            }
            ApiError::Unauthorized(_) => {
                warn!(error = %error_msg, status = %status, "Unauthorized")
            }
            ApiError::Internal(_) => {
                error!(error = %error_msg, status = %status, "Internal error")
            }
        }

        let error_response = ErrorResponse {
            error: error_msg,
            details,
        };

        HttpResponse::build(status).json(error_response)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(msg)) => ApiError::Validation(msg.clone()),
            Some(DomainError::NotFound(msg)) => ApiError::NotFound(msg.clone()),
            Some(DomainError::Unauthorized(msg)) => ApiError::Unauthorized(msg.clone()),
            Some(DomainError::Internal(msg)) => ApiError::Internal(msg.clone()),
            // Anything the store surfaces outside the taxonomy stays generic.
            None => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        anyhow::Error::from(err).into()
    }
}

// AuthenticatedUser extractor
impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();
        Box::pin(async move {
            user.ok_or_else(|| ApiError::Unauthorized("User not authenticated".to_string()))
        })
    }
}

// Handlers

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

// Recipes

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_recipes(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let recipes = state.recipes.list_recipes(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(recipes))
}

#[instrument(skip(state, user, req), fields(user_id = %user.user_id, recipe_id))]
pub async fn create_recipe(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateRecipe>,
) -> Result<HttpResponse, ApiError> {
    info!(title = %req.title, "Creating new recipe");
    let recipe = state
        .recipes
        .create_recipe(&user.user_id, req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create recipe");
            e
        })?;
    tracing::Span::current().record("recipe_id", recipe.id);
    info!(recipe_id = recipe.id, "Recipe created successfully");
    Ok(HttpResponse::Created().json(recipe))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id, recipe_id = %*path))]
pub async fn get_recipe(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<u32>,
) -> Result<HttpResponse, ApiError> {
    let recipe = state
        .recipes
        .get_recipe(&user.user_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(recipe))
}

#[instrument(skip(state, user, req), fields(user_id = %user.user_id, recipe_id = %*path))]
pub async fn put_recipe(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<u32>,
    req: web::Json<UpdateRecipe>,
) -> Result<HttpResponse, ApiError> {
    let recipe = state
        .recipes
        .update_recipe(&user.user_id, path.into_inner(), req.into_inner(), false)
        .await?;
    Ok(HttpResponse::Ok().json(recipe))
}

#[instrument(skip(state, user, req), fields(user_id = %user.user_id, recipe_id = %*path))]
pub async fn patch_recipe(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<u32>,
    req: web::Json<UpdateRecipe>,
) -> Result<HttpResponse, ApiError> {
    let recipe = state
        .recipes
        .update_recipe(&user.user_id, path.into_inner(), req.into_inner(), true)
        .await?;
    Ok(HttpResponse::Ok().json(recipe))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id, recipe_id = %*path))]
pub async fn delete_recipe(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<u32>,
) -> Result<HttpResponse, ApiError> {
    state
        .recipes
        .delete_recipe(&user.user_id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[instrument(skip(state, user, payload), fields(user_id = %user.user_id, recipe_id = %*path))]
pub async fn upload_recipe_image(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<u32>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let recipe_id = path.into_inner();
    let mut content_type: Option<String> = None;
    let mut data: Vec<u8> = Vec::new();
    let mut found = false;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }
        found = true;
        content_type = field.content_type().map(|mime| mime.to_string());
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ApiError::Validation(format!("Invalid multipart payload: {}", e)))?
        {
            data.extend_from_slice(&chunk);
        }
    }

    if !found {
        return Err(ApiError::Validation("Field 'image' is required".to_string()));
    }
    let content_type = content_type
        .ok_or_else(|| ApiError::Validation("Image content type is required".to_string()))?;

    let recipe = state
        .recipes
        .upload_image(&user.user_id, recipe_id, &content_type, &data)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store recipe image");
            e
        })?;
    info!(recipe_id = recipe_id, "Recipe image uploaded");
    Ok(HttpResponse::Ok().json(recipe))
}

// Tags

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_tags(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let tags = state.recipes.list_tags(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(tags))
}

#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn create_tag(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<NameRef>,
) -> Result<HttpResponse, ApiError> {
    let tag = state
        .recipes
        .create_tag(&user.user_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(tag))
}

#[instrument(skip(state, user, req), fields(user_id = %user.user_id, tag_id = %*path))]
pub async fn update_tag(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<u32>,
    req: web::Json<NameRef>,
) -> Result<HttpResponse, ApiError> {
    let tag = state
        .recipes
        .update_tag(&user.user_id, path.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(tag))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id, tag_id = %*path))]
pub async fn delete_tag(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<u32>,
) -> Result<HttpResponse, ApiError> {
    state
        .recipes
        .delete_tag(&user.user_id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

// Ingredients

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_ingredients(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let ingredients = state.recipes.list_ingredients(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(ingredients))
}

#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn create_ingredient(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<NameRef>,
) -> Result<HttpResponse, ApiError> {
    let ingredient = state
        .recipes
        .create_ingredient(&user.user_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ingredient))
}

#[instrument(skip(state, user, req), fields(user_id = %user.user_id, ingredient_id = %*path))]
pub async fn update_ingredient(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<u32>,
    req: web::Json<NameRef>,
) -> Result<HttpResponse, ApiError> {
    let ingredient = state
        .recipes
        .update_ingredient(&user.user_id, path.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ingredient))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id, ingredient_id = %*path))]
pub async fn delete_ingredient(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<u32>,
) -> Result<HttpResponse, ApiError> {
    state
        .recipes
        .delete_ingredient(&user.user_id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
