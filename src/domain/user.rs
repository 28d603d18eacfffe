use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Partial update of the authenticated user's own profile.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Normalizes an email the way the identity store requires: the domain part
/// (after the last `@`) is lowercased, the local part is kept as given.
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(DomainError::Validation("Email must not be empty".to_string()));
    }
    let at = email
        .rfind('@')
        .ok_or_else(|| DomainError::Validation("Invalid email address".to_string()))?;
    let (local, domain) = email.split_at(at);
    if local.is_empty() || domain.len() <= 1 {
        return Err(DomainError::Validation("Invalid email address".to_string()));
    }
    Ok(format!("{}{}", local, domain.to_lowercase()))
}
