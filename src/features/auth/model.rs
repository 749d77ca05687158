use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identity attached to the request context by the access-control gate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Database model for users. The `password` column only ever holds an
/// irreversible digest.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password: String,
    #[allow(dead_code)]
    pub created_at: DateTime<Utc>,
}
