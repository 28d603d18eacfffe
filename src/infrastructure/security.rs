use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

// Argon2 parameters for 50-150ms target latency
const ARGON2_M_COST: u32 = 19456; // 19 MB
const ARGON2_T_COST: u32 = 2; // 2 iterations
const ARGON2_P_COST: u32 = 1; // 1 parallelism

const ACCESS_TTL_SECS: usize = 3600; // 1 hour
const REFRESH_TTL_SECS: usize = 86400; // 24 hours

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user_id
    exp: usize,
    iat: usize,
    token_type: String,
}

/// An access/refresh pair as issued to a freshly authenticated user.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, None)
            .map_err(argon2::password_hash::Error::from)?,
    );

    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, None)
            .map_err(argon2::password_hash::Error::from)?,
    );

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

fn now_secs() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as usize
}

fn generate_token(
    user_id: &str,
    secret: &str,
    token_type: &str,
    ttl_secs: usize,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = now_secs();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + ttl_secs,
        iat: now,
        token_type: token_type.to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn generate_token_pair(
    user_id: &str,
    secret: &str,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    Ok(TokenPair {
        access: generate_token(user_id, secret, TOKEN_TYPE_ACCESS, ACCESS_TTL_SECS)?,
        refresh: generate_token(user_id, secret, TOKEN_TYPE_REFRESH, REFRESH_TTL_SECS)?,
    })
}

pub fn generate_access_token(
    user_id: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    generate_token(user_id, secret, TOKEN_TYPE_ACCESS, ACCESS_TTL_SECS)
}

/// Validates the token and checks its `token_type` claim. Returns the user id.
/// An access token presented where a refresh token is expected (or vice
/// versa) is rejected.
pub fn validate_token(
    token: &str,
    secret: &str,
    expected_type: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 60; // 60 seconds leeway

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;

    if token_data.claims.token_type != expected_type {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }

    Ok(token_data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_generates_valid_hash() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(!hash.is_empty());
        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_password_same_password_produces_different_hashes() {
        let password = "same_password";

        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();

        // Due to random salt, same password should produce different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct_password_returns_true() {
        let password = "correct_password";
        let hash = hash_password(password).unwrap();

        let result = verify_password(password, &hash).unwrap();
        assert!(result);
    }

    #[test]
    fn test_verify_password_incorrect_password_returns_false() {
        let password = "correct_password";
        let hash = hash_password(password).unwrap();

        let result = verify_password("wrong_password", &hash).unwrap();
        assert!(!result);
    }

    #[test]
    fn test_verify_password_invalid_hash_format() {
        let result = verify_password("test_password", "not_a_valid_hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_password_with_unicode() {
        let password = "пароль123";
        let hash = hash_password(password).unwrap();

        let result = verify_password(password, &hash).unwrap();
        assert!(result);
    }

    #[test]
    fn test_token_pair_contains_both_tokens() {
        let pair = generate_token_pair("user_123", "test_secret").unwrap();

        assert!(!pair.access.is_empty());
        assert!(!pair.refresh.is_empty());
        // JWT tokens have 3 parts separated by dots
        assert_eq!(pair.access.split('.').count(), 3);
        assert_eq!(pair.refresh.split('.').count(), 3);
    }

    #[test]
    fn test_access_token_round_trip() {
        let pair = generate_token_pair("user_456", "test_secret").unwrap();

        let user_id = validate_token(&pair.access, "test_secret", TOKEN_TYPE_ACCESS).unwrap();
        assert_eq!(user_id, "user_456");
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let pair = generate_token_pair("user_789", "test_secret").unwrap();

        let user_id = validate_token(&pair.refresh, "test_secret", TOKEN_TYPE_REFRESH).unwrap();
        assert_eq!(user_id, "user_789");
    }

    #[test]
    fn test_refresh_token_rejected_as_access_token() {
        let pair = generate_token_pair("user_1", "test_secret").unwrap();

        let result = validate_token(&pair.refresh, "test_secret", TOKEN_TYPE_ACCESS);
        assert!(result.is_err());
    }

    #[test]
    fn test_access_token_rejected_as_refresh_token() {
        let pair = generate_token_pair("user_1", "test_secret").unwrap();

        let result = validate_token(&pair.access, "test_secret", TOKEN_TYPE_REFRESH);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_token_rejects_invalid_token() {
        let result = validate_token("invalid.token.here", "secret_key", TOKEN_TYPE_ACCESS);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_token_rejects_token_with_wrong_secret() {
        let pair = generate_token_pair("test_user", "correct_secret").unwrap();

        let result = validate_token(&pair.access, "wrong_secret", TOKEN_TYPE_ACCESS);
        assert!(result.is_err());
    }

    #[test]
    fn test_generate_token_different_users_produce_different_tokens() {
        let token1 = generate_access_token("user1", "test_secret").unwrap();
        let token2 = generate_access_token("user2", "test_secret").unwrap();

        assert_ne!(token1, token2);
    }
}
