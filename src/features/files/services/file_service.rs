use std::sync::Arc;

use sqlx::sqlite::SqlitePool;

use crate::core::error::{AppError, Result};
use crate::modules::storage::LocalStore;

/// A stored file resolved for delivery.
pub struct StoredFile {
    pub original_name: String,
    pub data: Vec<u8>,
}

/// Service resolving storage keys to deliverable files. A key is served
/// only when an entry row references it AND the bytes exist on disk;
/// orphans on either side are a 404.
pub struct FileService {
    pool: SqlitePool,
    storage: Arc<LocalStore>,
}

impl FileService {
    pub fn new(pool: SqlitePool, storage: Arc<LocalStore>) -> Self {
        Self { pool, storage }
    }

    pub async fn fetch(&self, key: &str) -> Result<StoredFile> {
        let original_name: Option<String> = sqlx::query_scalar(
            r#"
            SELECT COALESCE(NULLIF(original_name, ''), NULLIF(filename, ''), 'document.pdf')
            FROM pdfs
            WHERE path = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        let original_name =
            original_name.ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let data = self.storage.read(key).await?;
        Ok(StoredFile {
            original_name,
            data,
        })
    }
}
