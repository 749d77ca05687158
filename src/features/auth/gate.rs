//! Access-control gate: turns a bearer token into a [`CurrentUser`].

use sqlx::sqlite::SqlitePool;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::CurrentUser;
use crate::features::auth::services::TokenService;

pub struct AuthGate {
    pool: SqlitePool,
    tokens: Arc<TokenService>,
}

impl AuthGate {
    pub fn new(pool: SqlitePool, tokens: Arc<TokenService>) -> Self {
        Self { pool, tokens }
    }

    /// Verify a token and load the account it belongs to. A valid token for
    /// a deleted account is treated the same as an invalid token.
    pub async fn resolve(&self, token: &str) -> Result<CurrentUser> {
        let user_id = self.tokens.verify(token)?;

        let user = sqlx::query_as::<_, CurrentUser>(
            "SELECT id, email, name FROM users WHERE id = ?",
        )
        .bind(&user_id)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| AppError::Forbidden("Invalid or expired token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;
    use crate::shared::test_helpers::{seed_user, test_pool};

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_secs: 3600,
        }))
    }

    #[tokio::test]
    async fn test_resolve_known_user() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "u1", "alice@example.com", "Alice").await;
        let tokens = tokens();
        let gate = AuthGate::new(pool, Arc::clone(&tokens));

        let token = tokens.issue(&user.id).unwrap();
        let resolved = gate.resolve(&token).await.unwrap();
        assert_eq!(resolved.id, "u1");
        assert_eq!(resolved.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_token_for_missing_user_is_forbidden() {
        let pool = test_pool().await;
        let tokens = tokens();
        let gate = AuthGate::new(pool, Arc::clone(&tokens));

        let token = tokens.issue("ghost").unwrap();
        assert!(matches!(
            gate.resolve(&token).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_token_is_forbidden() {
        let pool = test_pool().await;
        let gate = AuthGate::new(pool, tokens());
        assert!(matches!(
            gate.resolve("garbage").await,
            Err(AppError::Forbidden(_))
        ));
    }
}
