use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for a box
#[derive(Debug, Clone, FromRow)]
pub struct BoxRecord {
    pub id: String,
    pub name: String,
    #[allow(dead_code)]
    pub user_id: String,
    pub retention_date: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A box joined with its live entry count
#[derive(Debug, Clone, FromRow)]
pub struct BoxWithCount {
    pub id: String,
    pub name: String,
    #[allow(dead_code)]
    pub user_id: String,
    pub retention_date: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub pdf_count: i64,
}
