use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for an entry in a box. File-backed entries carry the
/// storage key in `path`; title-only entries leave the file columns NULL
/// (or, on the legacy schema, empty placeholders).
#[derive(Debug, Clone, FromRow)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub filename: Option<String>,
    pub original_name: Option<String>,
    pub path: Option<String>,
    pub size: i64,
    pub box_id: String,
    pub upload_date: DateTime<Utc>,
}
