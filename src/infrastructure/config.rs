use std::env;

/// Runtime configuration, read once at startup from the environment
/// (a `.env` file is honored via dotenv).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub media_root: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "insecure-dev-secret-change-me".to_string()),
            media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
        }
    }
}
