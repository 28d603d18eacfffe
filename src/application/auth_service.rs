use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{normalize_email, CreateUser, LoginRequest, UpdateUser, User};
use crate::infrastructure::security::{
    generate_access_token, generate_token_pair, hash_password, validate_token, verify_password,
    TokenPair, TOKEN_TYPE_REFRESH,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

pub struct AuthService<R: UserRepository> {
    user_repository: Arc<R>,
    jwt_secret: String,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(user_repository: Arc<R>, jwt_secret: String) -> Self {
        Self {
            user_repository,
            jwt_secret,
        }
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register_user(&self, req: CreateUser) -> Result<User> {
        trace!("Starting user registration");

        let email = normalize_email(&req.email)?;
        if req.password.len() < 5 {
            return Err(
                DomainError::Validation("Password must be at least 5 characters".to_string())
                    .into(),
            );
        }

        let password_hash = hash_password(&req.password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            is_staff: false,
            is_superuser: false,
        };

        debug!(user_id = %user.id, email = %user.email, "Saving user to repository");
        // The store decides uniqueness under its own lock; a separate
        // lookup here would race with concurrent registrations.
        if !self
            .user_repository
            .save_user_if_email_free(user.clone())
            .await?
        {
            warn!(email = %user.email, "User already exists");
            return Err(
                DomainError::Validation("User with this email already exists".to_string()).into(),
            );
        }

        info!(user_id = %user.id, email = %user.email, "User registered successfully");
        Ok(user)
    }

    /// Verifies credentials and issues an access/refresh token pair.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> Result<TokenPair> {
        trace!("Starting login");

        // The stored email is normalized, so normalize the submitted one
        // before the lookup. A malformed email can never match.
        let email = normalize_email(&req.email)
            .map_err(|_| DomainError::Unauthorized("Invalid email or password".to_string()))?;

        let user = self
            .user_repository
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| {
                warn!(email = %req.email, "User not found during login");
                DomainError::Unauthorized("Invalid email or password".to_string())
            })?;

        let is_valid = verify_password(&req.password, &user.password_hash).map_err(|e| {
            error!(error = %e, "Failed to verify password");
            DomainError::Internal(format!("Failed to verify password: {}", e))
        })?;

        if !is_valid {
            warn!(user_id = %user.id, "Invalid password during login");
            return Err(DomainError::Unauthorized("Invalid email or password".to_string()).into());
        }

        let pair = generate_token_pair(&user.id, &self.jwt_secret).map_err(|e| {
            error!(error = %e, "Failed to generate tokens");
            DomainError::Internal(format!("Failed to generate tokens: {}", e))
        })?;

        info!(user_id = %user.id, "Login successful");
        Ok(pair)
    }

    /// Exchanges a refresh token for a fresh access token.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let user_id = validate_token(refresh_token, &self.jwt_secret, TOKEN_TYPE_REFRESH)
            .map_err(|e| {
                warn!(error = %e, "Invalid refresh token");
                DomainError::Unauthorized("Invalid refresh token".to_string())
            })?;

        // The user may have been removed since the token was issued.
        let user = self
            .user_repository
            .find_user_by_id(&user_id)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("Invalid refresh token".to_string()))?;

        let access = generate_access_token(&user.id, &self.jwt_secret).map_err(|e| {
            error!(error = %e, "Failed to generate token");
            DomainError::Internal(format!("Failed to generate token: {}", e))
        })?;

        info!(user_id = %user.id, "Access token refreshed");
        Ok(access)
    }

    #[instrument(skip(self), fields(user_id = user_id))]
    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.user_repository
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("User not found".to_string()).into())
    }

    /// Applies a partial profile update. A new email is re-normalized and
    /// re-checked for uniqueness; a new password is re-hashed.
    #[instrument(skip(self, req), fields(user_id = user_id))]
    pub async fn update_user(&self, user_id: &str, req: UpdateUser) -> Result<User> {
        let mut user = self.get_user(user_id).await?;

        if let Some(email) = req.email {
            user.email = normalize_email(&email)?;
        }

        if let Some(password) = req.password {
            if password.len() < 5 {
                return Err(DomainError::Validation(
                    "Password must be at least 5 characters".to_string(),
                )
                .into());
            }
            user.password_hash = hash_password(&password).map_err(|e| {
                error!(error = %e, "Failed to hash password");
                DomainError::Internal(format!("Failed to hash password: {}", e))
            })?;
        }

        if !self
            .user_repository
            .save_user_if_email_free(user.clone())
            .await?
        {
            return Err(DomainError::Validation(
                "User with this email already exists".to_string(),
            )
            .into());
        }
        info!(user_id = %user.id, "User profile updated");
        Ok(user)
    }
}
