use std::sync::Arc;

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{AuthResponseDto, LoginDto, RegisterDto};
use crate::features::auth::model::User;
use crate::features::auth::services::password;
use crate::features::auth::services::{LicenseService, TokenService};

/// Registration and login.
pub struct AuthService {
    pool: SqlitePool,
    tokens: Arc<TokenService>,
    licenses: Arc<LicenseService>,
}

impl AuthService {
    pub fn new(pool: SqlitePool, tokens: Arc<TokenService>, licenses: Arc<LicenseService>) -> Self {
        Self {
            pool,
            tokens,
            licenses,
        }
    }

    /// Create an account gated by a license code and return a fresh session
    /// token. License consumption, user insert and usage record share one
    /// transaction: a failed registration never burns a code use.
    pub async fn register(&self, dto: RegisterDto) -> Result<AuthResponseDto> {
        let email = dto.email.trim().to_string();
        let name = dto.name.trim().to_string();

        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        if self
            .licenses
            .email_already_used(&dto.license_code, &email)
            .await?
        {
            return Err(AppError::BadRequest(
                "This license code has already been used by this email address".to_string(),
            ));
        }

        let digest = password::hash_password(&dto.password)?;
        let user_id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        self.licenses.consume(&mut tx, &dto.license_code).await?;

        sqlx::query(
            "INSERT INTO users (id, name, email, password, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user_id)
        .bind(&name)
        .bind(&email)
        .bind(&digest)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                AppError::Conflict("An account with this email already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        self.licenses
            .record_usage(&mut tx, &dto.license_code, &user_id)
            .await?;

        tx.commit().await?;

        info!("User registered: id={}, email={}", user_id, email);

        let token = self.tokens.issue(&user_id)?;
        Ok(AuthResponseDto {
            id: user_id,
            name,
            email,
            token,
        })
    }

    /// Verify credentials and return a fresh session token. Unknown email
    /// and wrong password are indistinguishable to the caller.
    pub async fn login(&self, dto: LoginDto) -> Result<AuthResponseDto> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, password, created_at FROM users WHERE email = ?",
        )
        .bind(dto.email.trim())
        .fetch_optional(&self.pool)
        .await?;

        let user = user.ok_or_else(|| {
            AppError::Unauthorized("Invalid email or password".to_string())
        })?;

        if !password::verify_password(&dto.password, &user.password)? {
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self.tokens.issue(&user.id)?;
        Ok(AuthResponseDto {
            id: user.id,
            name: user.name,
            email: user.email,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{AuthConfig, LicenseSeed};
    use crate::shared::test_helpers::test_pool;

    async fn service(pool: &SqlitePool) -> (AuthService, Arc<TokenService>) {
        let tokens = Arc::new(TokenService::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_secs: 3600,
        }));
        let licenses = Arc::new(LicenseService::new(pool.clone()));
        licenses
            .seed(&[LicenseSeed {
                code: "CODE-1".to_string(),
                max_uses: 3,
            }])
            .await
            .unwrap();
        (
            AuthService::new(pool.clone(), Arc::clone(&tokens), licenses),
            tokens,
        )
    }

    fn register_dto(email: &str, license: &str) -> RegisterDto {
        RegisterDto {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            license_code: license.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_token_resolves_to_new_user() {
        let pool = test_pool().await;
        let (auth, tokens) = service(&pool).await;

        let response = auth
            .register(register_dto("alice@example.com", "CODE-1"))
            .await
            .unwrap();

        assert_eq!(tokens.verify(&response.token).unwrap(), response.id);
        assert_eq!(response.email, "alice@example.com");

        // Password is stored only as a digest
        let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE id = ?")
            .bind(&response.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_ne!(stored, "secret1");
        assert!(stored.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let pool = test_pool().await;
        let (auth, _) = service(&pool).await;

        auth.register(register_dto("alice@example.com", "CODE-1"))
            .await
            .unwrap();
        let err = auth
            .register(register_dto("alice@example.com", "CODE-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invalid_license_rejected_without_user_row() {
        let pool = test_pool().await;
        let (auth, _) = service(&pool).await;

        let err = auth
            .register(register_dto("alice@example.com", "BAD-CODE"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(users, 0);
    }

    #[tokio::test]
    async fn test_license_exhaustion() {
        let pool = test_pool().await;
        let (auth, _) = service(&pool).await;

        for i in 0..3 {
            auth.register(register_dto(&format!("user{}@example.com", i), "CODE-1"))
                .await
                .unwrap();
        }
        let err = auth
            .register(register_dto("late@example.com", "CODE-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("maximum usage")));
    }

    #[tokio::test]
    async fn test_login_roundtrip_and_bad_password() {
        let pool = test_pool().await;
        let (auth, tokens) = service(&pool).await;

        let created = auth
            .register(register_dto("alice@example.com", "CODE-1"))
            .await
            .unwrap();

        let logged_in = auth
            .login(LoginDto {
                email: "alice@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, created.id);
        assert_eq!(tokens.verify(&logged_in.token).unwrap(), created.id);

        let err = auth
            .login(LoginDto {
                email: "alice@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = auth
            .login(LoginDto {
                email: "nobody@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
