//! Token signing capability: `sign(subject, ttl)` and `verify(token)`.
//!
//! HS256 over `{ sub: email, exp, jti }`. The wire format is opaque to the
//! rest of the system; validity of a token additionally depends on the
//! session store still listing it (see `services::session_service`).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account's email address.
    pub sub: String,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Unique per issuance, so tokens minted in the same second still
    /// revoke independently.
    pub jti: Uuid,
}

pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn sign(&self, subject: &str, ttl: Duration) -> AppResult<String> {
        let claims = Claims {
            sub: subject.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
            jti: Uuid::new_v4(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Storage(format!("token signing failed: {e}")))
    }

    /// Malformed, tampered and expired tokens all fail as `Unauthorized`.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_returns_subject() {
        let signer = TokenSigner::new("test-secret");
        let token = signer.sign("alice@tryst.app", Duration::minutes(60)).unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice@tryst.app");
    }

    #[test]
    fn tokens_are_unique_per_issuance() {
        let signer = TokenSigner::new("test-secret");
        let a = signer.sign("alice@tryst.app", Duration::minutes(60)).unwrap();
        let b = signer.sign("alice@tryst.app", Duration::minutes(60)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let signer = TokenSigner::new("test-secret");
        let token = signer.sign("alice@tryst.app", Duration::minutes(-120)).unwrap();
        assert!(matches!(signer.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let signer = TokenSigner::new("test-secret");
        let other = TokenSigner::new("other-secret");
        let token = signer.sign("alice@tryst.app", Duration::minutes(60)).unwrap();
        assert!(matches!(other.verify(&token), Err(AppError::Unauthorized)));
    }
}
