use std::sync::Arc;

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::core::config::UploadConfig;
use crate::core::error::{AppError, Result};
use crate::features::entries::dtos::EntryResponseDto;
use crate::features::entries::models::Entry;
use crate::modules::storage::LocalStore;
use crate::shared::constants::UNTITLED_PREFIX;

/// One file received in an upload request, fully buffered.
pub struct UploadedFile {
    pub original_name: String,
    pub data: Vec<u8>,
}

/// Service for entry lifecycle operations inside a box.
pub struct EntryService {
    pool: SqlitePool,
    storage: Arc<LocalStore>,
    config: UploadConfig,
}

impl EntryService {
    pub fn new(pool: SqlitePool, storage: Arc<LocalStore>, config: UploadConfig) -> Self {
        Self {
            pool,
            storage,
            config,
        }
    }

    /// Store uploaded files and insert their entry rows. Titles beyond the
    /// file count become title-only entries in the same batch.
    ///
    /// Files are staged to disk first; the rows then go in as a single
    /// transaction. Any failure rolls the rows back and unlinks every file
    /// staged during this request, so the store never references a row that
    /// does not exist and vice versa.
    pub async fn upload(
        &self,
        user_id: &str,
        box_id: &str,
        titles: Vec<String>,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<EntryResponseDto>> {
        self.assert_box_owned(user_id, box_id).await?;

        if files.len() > self.config.max_files_per_upload {
            return Err(AppError::BadRequest(format!(
                "Too many files: maximum is {} per upload",
                self.config.max_files_per_upload
            )));
        }
        for file in &files {
            if file.data.len() > self.config.max_file_size {
                return Err(AppError::PayloadTooLarge(format!(
                    "File '{}' exceeds the maximum size of {} bytes",
                    file.original_name, self.config.max_file_size
                )));
            }
        }

        // Blank titles stay in place so pairing keeps its indices
        let titles: Vec<String> = titles.into_iter().map(|t| t.trim().to_string()).collect();
        if titles.iter().all(|t| t.is_empty()) {
            return Err(AppError::Validation(
                "At least one title is required".to_string(),
            ));
        }

        let mut staged: Vec<String> = Vec::with_capacity(files.len());
        let result = self
            .stage_and_insert(box_id, &titles, &files, &mut staged)
            .await;

        if result.is_err() {
            for key in &staged {
                self.storage.delete_quietly(key).await;
            }
        }
        result
    }

    async fn stage_and_insert(
        &self,
        box_id: &str,
        titles: &[String],
        files: &[UploadedFile],
        staged: &mut Vec<String>,
    ) -> Result<Vec<EntryResponseDto>> {
        let total = files.len().max(titles.len());
        let mut entries: Vec<Entry> = Vec::with_capacity(total);

        for i in 0..total {
            // Pairs past the file count carry a title but no file
            let (filename, original_name, path, size) = match files.get(i) {
                Some(file) => {
                    let key = LocalStore::generate_key(&file.original_name);
                    self.storage.write(&key, &file.data).await?;
                    staged.push(key.clone());
                    (
                        Some(key.clone()),
                        Some(file.original_name.clone()),
                        Some(key),
                        file.data.len() as i64,
                    )
                }
                None => (None, None, None, 0),
            };

            entries.push(Entry {
                id: Uuid::new_v4().to_string(),
                title: entry_title(titles, i, files.len()),
                filename,
                original_name,
                path,
                size,
                box_id: box_id.to_string(),
                upload_date: Utc::now(),
            });
        }

        let mut tx = self.pool.begin().await?;
        for entry in &entries {
            sqlx::query(
                r#"
                INSERT INTO pdfs (id, title, filename, original_name, path, size, box_id, upload_date)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&entry.id)
            .bind(&entry.title)
            .bind(&entry.filename)
            .bind(&entry.original_name)
            .bind(&entry.path)
            .bind(entry.size)
            .bind(&entry.box_id)
            .bind(entry.upload_date)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!("Uploaded {} file(s) into box {}", entries.len(), box_id);
        Ok(entries.into_iter().map(Into::into).collect())
    }

    /// Create an entry with no backing file. The file columns are NULL; on
    /// a legacy schema where `filename` is still NOT NULL the insert retries
    /// with empty-string placeholders.
    pub async fn create_title_only(
        &self,
        user_id: &str,
        box_id: &str,
        title: &str,
    ) -> Result<EntryResponseDto> {
        self.assert_box_owned(user_id, box_id).await?;

        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }

        let entry = Entry {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            filename: None,
            original_name: None,
            path: None,
            size: 0,
            box_id: box_id.to_string(),
            upload_date: Utc::now(),
        };

        let insert = sqlx::query(
            r#"
            INSERT INTO pdfs (id, title, filename, original_name, path, size, box_id, upload_date)
            VALUES (?, ?, NULL, NULL, NULL, 0, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.title)
        .bind(&entry.box_id)
        .bind(entry.upload_date)
        .execute(&self.pool)
        .await;

        if let Err(e) = insert {
            let not_null = e
                .as_database_error()
                .map(|d| d.message().contains("NOT NULL"))
                .unwrap_or(false);
            if !not_null {
                return Err(AppError::Database(e));
            }

            sqlx::query(
                r#"
                INSERT INTO pdfs (id, title, filename, original_name, path, size, box_id, upload_date)
                VALUES (?, ?, '', '', '', 0, ?, ?)
                "#,
            )
            .bind(&entry.id)
            .bind(&entry.title)
            .bind(&entry.box_id)
            .bind(entry.upload_date)
            .execute(&self.pool)
            .await?;
        }

        Ok(entry.into())
    }

    /// Delete one entry and its backing file (if any). File removal is best
    /// effort.
    pub async fn delete(&self, user_id: &str, box_id: &str, entry_id: &str) -> Result<()> {
        self.assert_box_owned(user_id, box_id).await?;

        let path: Option<Option<String>> =
            sqlx::query_scalar("SELECT path FROM pdfs WHERE id = ? AND box_id = ?")
                .bind(entry_id)
                .bind(box_id)
                .fetch_optional(&self.pool)
                .await?;

        let path = path.ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        if let Some(key) = path.filter(|p| !p.is_empty()) {
            self.storage.delete_quietly(&key).await;
        }

        sqlx::query("DELETE FROM pdfs WHERE id = ? AND box_id = ?")
            .bind(entry_id)
            .bind(box_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn assert_box_owned(&self, user_id: &str, box_id: &str) -> Result<()> {
        let exists: Option<String> =
            sqlx::query_scalar("SELECT id FROM boxes WHERE id = ? AND user_id = ?")
                .bind(box_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        exists
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Box not found".to_string()))
    }
}

/// Pick the title for file `i` of `total`. One title spread over many files
/// gets numbered ` (n)` suffixes in file order; otherwise titles pair by
/// index, falling back to the first title, then to a generated one. A blank
/// title occupies its index but never wins the fallback.
fn entry_title(titles: &[String], i: usize, total: usize) -> String {
    if titles.len() == 1 && total > 1 {
        format!("{} ({})", titles[0], i + 1)
    } else {
        titles
            .get(i)
            .filter(|t| !t.is_empty())
            .or_else(|| titles.first().filter(|t| !t.is_empty()))
            .cloned()
            .unwrap_or_else(|| format!("{} {}", UNTITLED_PREFIX, i + 1))
    }
}
