//! Registration license codes.
//!
//! Each code is a `license_codes` row with a use counter; consumption is a
//! single guarded UPDATE so concurrent registrations cannot exceed
//! `max_uses`. `license_usage` records which user consumed which code and
//! blocks reuse by the same email.

use sqlx::sqlite::SqlitePool;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::core::config::LicenseSeed;
use crate::core::error::{AppError, Result};

pub struct LicenseService {
    pool: SqlitePool,
}

impl LicenseService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert configured codes at startup. `max_uses` follows configuration;
    /// `current_uses` is never reset.
    pub async fn seed(&self, codes: &[LicenseSeed]) -> Result<()> {
        for seed in codes {
            sqlx::query(
                r#"
                INSERT INTO license_codes (code, max_uses)
                VALUES (?, ?)
                ON CONFLICT(code) DO UPDATE SET max_uses = excluded.max_uses
                "#,
            )
            .bind(&seed.code)
            .bind(seed.max_uses)
            .execute(&self.pool)
            .await?;
        }

        if !codes.is_empty() {
            tracing::info!("Seeded {} license code(s)", codes.len());
        }
        Ok(())
    }

    /// Whether this code was already consumed by an account with this email.
    pub async fn email_already_used(&self, code: &str, email: &str) -> Result<bool> {
        let existing: Option<String> = sqlx::query_scalar(
            r#"
            SELECT lu.id FROM license_usage lu
            JOIN users u ON u.id = lu.user_id
            WHERE lu.license_code = ? AND u.email = ?
            "#,
        )
        .bind(code)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(existing.is_some())
    }

    /// Atomically consume one use of a code. Runs on the caller's
    /// transaction so the consumption rolls back with a failed registration.
    pub async fn consume(&self, conn: &mut SqliteConnection, code: &str) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE license_codes
            SET current_uses = current_uses + 1
            WHERE code = ? AND current_uses < max_uses
            "#,
        )
        .bind(code)
        .execute(&mut *conn)
        .await?;

        if updated.rows_affected() == 0 {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT 1 FROM license_codes WHERE code = ?")
                    .bind(code)
                    .fetch_optional(&mut *conn)
                    .await?;

            let message = if exists.is_some() {
                "License code has reached maximum usage limit"
            } else {
                "Invalid license code"
            };
            return Err(AppError::BadRequest(message.to_string()));
        }

        Ok(())
    }

    /// Record which user consumed the code (same transaction as `consume`).
    pub async fn record_usage(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
        user_id: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO license_usage (id, license_code, user_id) VALUES (?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(code)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
