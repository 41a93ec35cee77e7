use dotenvy::dotenv;
use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Lifetime of an issued access token, in minutes.
    pub token_ttl_minutes: i64,
    /// Upper bound on concurrently valid tokens per account; the oldest
    /// token is evicted when a login would exceed it.
    pub max_sessions_per_user: usize,
    pub cors_origins: Vec<String>,
}

impl Config {
    fn parse_origins(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8000);
        let jwt_secret =
            env::var("JWT_SECRET_KEY").map_err(|_| AppError::Config("JWT_SECRET_KEY missing".into()))?;
        let token_ttl_minutes = env::var("TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        let max_sessions_per_user = env::var("MAX_SESSIONS_PER_USER")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(16);
        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| Self::parse_origins(&v))
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            jwt_secret,
            token_ttl_minutes,
            max_sessions_per_user,
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_origins_splits_and_trims() {
        let origins = Config::parse_origins("http://localhost:3000, https://tryst.app ,");
        assert_eq!(
            origins,
            vec![
                "http://localhost:3000".to_string(),
                "https://tryst.app".to_string()
            ]
        );
    }

    #[test]
    fn parse_origins_empty_value() {
        assert!(Config::parse_origins("").is_empty());
    }
}
