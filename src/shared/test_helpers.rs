#[cfg(test)]
use crate::core::schema;
#[cfg(test)]
use crate::features::auth::model::CurrentUser;
#[cfg(test)]
use crate::modules::storage::LocalStore;

#[cfg(test)]
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
#[cfg(test)]
use std::str::FromStr;
#[cfg(test)]
use std::sync::Arc;

/// In-memory SQLite pool with no tables. A single connection keeps the
/// in-memory database alive for the whole test.
#[cfg(test)]
pub async fn bare_test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite options")
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory sqlite pool")
}

/// In-memory pool with the full schema initialized.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = bare_test_pool().await;
    schema::initialize(&pool).await.expect("schema init");
    pool
}

/// Temp-dir backed storage for upload tests. Keep the `TempDir` alive for
/// the duration of the test.
#[cfg(test)]
pub fn test_storage() -> (tempfile::TempDir, Arc<LocalStore>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(LocalStore::new(dir.path()));
    (dir, store)
}

#[cfg(test)]
pub async fn seed_user(pool: &SqlitePool, id: &str, email: &str, name: &str) -> CurrentUser {
    sqlx::query("INSERT INTO users (id, email, name, password) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(email)
        .bind(name)
        .bind("$argon2id$test-digest")
        .execute(pool)
        .await
        .expect("seed user");

    CurrentUser {
        id: id.to_string(),
        email: email.to_string(),
        name: name.to_string(),
    }
}
