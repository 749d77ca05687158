//! Signed session token issuance and verification (HS256 JWT).

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// The user id the token was issued for
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct TokenService {
    secret: String,
    token_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            token_ttl_secs: config.token_ttl_secs,
        }
    }

    /// Issue a signed, time-limited token embedding the user id.
    pub fn issue(&self, user_id: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.token_ttl_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token and return the user id it was issued for. Any
    /// signature or expiry failure is a `Forbidden`.
    pub fn verify(&self, token: &str) -> Result<String> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            AppError::Forbidden("Invalid or expired token".to_string())
        })?;

        Ok(data.claims.sub)
    }
}
