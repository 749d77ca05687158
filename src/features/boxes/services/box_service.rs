use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use qrcode::render::svg;
use qrcode::QrCode;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::boxes::dtos::{
    BoxDetailDto, BoxResponseDto, BoxStatus, CreateBoxDto, QrCodeResponseDto, UpdateBoxDto,
};
use crate::features::boxes::models::{BoxRecord, BoxWithCount};
use crate::features::entries::dtos::EntryResponseDto;
use crate::features::entries::models::Entry;
use crate::modules::storage::LocalStore;

const BOX_WITH_COUNT: &str = r#"
SELECT b.id, b.name, b.user_id, b.retention_date, b.status, b.created_at,
       COUNT(p.id) AS pdf_count
FROM boxes b
LEFT JOIN pdfs p ON p.box_id = b.id
"#;

/// Service for box lifecycle operations. Every query is scoped to the
/// owner; a box belonging to someone else is indistinguishable from a
/// missing one.
pub struct BoxService {
    pool: SqlitePool,
    storage: Arc<LocalStore>,
    public_base_url: String,
}

impl BoxService {
    pub fn new(pool: SqlitePool, storage: Arc<LocalStore>, public_base_url: String) -> Self {
        Self {
            pool,
            storage,
            public_base_url,
        }
    }

    /// List the owner's boxes with live entry counts, newest first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<BoxResponseDto>> {
        let sql = format!(
            "{} WHERE b.user_id = ? GROUP BY b.id ORDER BY b.created_at DESC",
            BOX_WITH_COUNT
        );
        let boxes = sqlx::query_as::<_, BoxWithCount>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(boxes.into_iter().map(Into::into).collect())
    }

    /// Get one of the owner's boxes with its entries.
    pub async fn get(&self, user_id: &str, box_id: &str) -> Result<BoxDetailDto> {
        let record = self.find_owned(user_id, box_id).await?;

        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, title, filename, original_name, path, COALESCE(size, 0) AS size,
                   box_id, upload_date
            FROM pdfs
            WHERE box_id = ?
            ORDER BY upload_date DESC
            "#,
        )
        .bind(box_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(BoxDetailDto::from_parts(
            record,
            entries.into_iter().map(EntryResponseDto::from).collect(),
        ))
    }

    pub async fn create(&self, user_id: &str, dto: CreateBoxDto) -> Result<BoxResponseDto> {
        let name = dto.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Box name is required".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let status = dto.status.unwrap_or(BoxStatus::Active);
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO boxes (id, name, user_id, retention_date, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(user_id)
        .bind(&dto.retention_date)
        .bind(status.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(BoxResponseDto {
            id,
            name: name.to_string(),
            retention_date: dto.retention_date,
            status: status.as_str().to_string(),
            created_at,
            pdf_count: 0,
        })
    }

    /// Replace a box's mutable fields.
    pub async fn update(
        &self,
        user_id: &str,
        box_id: &str,
        dto: UpdateBoxDto,
    ) -> Result<BoxResponseDto> {
        let name = dto.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Box name is required".to_string()));
        }

        let status = dto.status.unwrap_or(BoxStatus::Active);
        let updated = sqlx::query(
            r#"
            UPDATE boxes SET name = ?, retention_date = ?, status = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(name)
        .bind(&dto.retention_date)
        .bind(status.as_str())
        .bind(box_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Box not found".to_string()));
        }

        let sql = format!("{} WHERE b.id = ? GROUP BY b.id", BOX_WITH_COUNT);
        let record = sqlx::query_as::<_, BoxWithCount>(&sql)
            .bind(box_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(record.into())
    }

    /// Delete a box, its entries and their backing files. File removal is
    /// best effort; the rows go regardless.
    pub async fn delete(&self, user_id: &str, box_id: &str) -> Result<()> {
        self.find_owned(user_id, box_id).await?;

        let paths: Vec<String> = sqlx::query_scalar(
            "SELECT path FROM pdfs WHERE box_id = ? AND path IS NOT NULL AND path != ''",
        )
        .bind(box_id)
        .fetch_all(&self.pool)
        .await?;

        for path in &paths {
            self.storage.delete_quietly(path).await;
        }

        // Cascade removes the entry rows
        sqlx::query("DELETE FROM boxes WHERE id = ? AND user_id = ?")
            .bind(box_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Deleted box {} with {} stored file(s)", box_id, paths.len());
        Ok(())
    }

    /// Render the QR code pointing at the box's public view.
    pub async fn qr(&self, user_id: &str, box_id: &str) -> Result<QrCodeResponseDto> {
        self.find_owned(user_id, box_id).await?;

        let url = format!(
            "{}/view/{}",
            self.public_base_url.trim_end_matches('/'),
            box_id
        );

        let code = QrCode::new(url.as_bytes())
            .map_err(|e| AppError::Internal(format!("Failed to render QR code: {}", e)))?;
        let image = code
            .render::<svg::Color>()
            .min_dimensions(240, 240)
            .build();

        Ok(QrCodeResponseDto {
            qr_code: format!("data:image/svg+xml;base64,{}", BASE64.encode(image)),
            url,
        })
    }

    async fn find_owned(&self, user_id: &str, box_id: &str) -> Result<BoxRecord> {
        let record = sqlx::query_as::<_, BoxRecord>(
            r#"
            SELECT id, name, user_id, retention_date, status, created_at
            FROM boxes
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(box_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        record.ok_or_else(|| AppError::NotFound("Box not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{seed_user, test_pool, test_storage};

    async fn service(pool: &SqlitePool) -> (tempfile::TempDir, BoxService) {
        let (dir, storage) = test_storage();
        (
            dir,
            BoxService::new(
                pool.clone(),
                storage,
                "http://localhost:3000".to_string(),
            ),
        )
    }

    fn create_dto(name: &str) -> CreateBoxDto {
        CreateBoxDto {
            name: name.to_string(),
            retention_date: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_trims() {
        let pool = test_pool().await;
        seed_user(&pool, "u1", "a@b.c", "A").await;
        let (_dir, service) = service(&pool).await;

        let created = service.create("u1", create_dto("  Archive 2025  ")).await.unwrap();
        assert_eq!(created.name, "Archive 2025");
        assert_eq!(created.status, "active");
        assert_eq!(created.pdf_count, 0);

        let err = service.create("u1", create_dto("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped_and_counts_entries() {
        let pool = test_pool().await;
        seed_user(&pool, "u1", "a@b.c", "A").await;
        seed_user(&pool, "u2", "b@b.c", "B").await;
        let (_dir, service) = service(&pool).await;

        let mine = service.create("u1", create_dto("Mine")).await.unwrap();
        service.create("u2", create_dto("Theirs")).await.unwrap();

        sqlx::query(
            "INSERT INTO pdfs (id, title, box_id, size) VALUES ('p1', 'Doc', ?, 10)",
        )
        .bind(&mine.id)
        .execute(&pool)
        .await
        .unwrap();

        let listed = service.list("u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);
        assert_eq!(listed[0].pdf_count, 1);
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let pool = test_pool().await;
        seed_user(&pool, "u1", "a@b.c", "A").await;
        let (_dir, service) = service(&pool).await;

        for (id, created_at) in [("b1", "2024-01-01 10:00:00"), ("b2", "2024-06-01 10:00:00")] {
            sqlx::query(
                "INSERT INTO boxes (id, name, user_id, created_at) VALUES (?, 'Box', 'u1', ?)",
            )
            .bind(id)
            .bind(created_at)
            .execute(&pool)
            .await
            .unwrap();
        }

        let listed = service.list("u1").await.unwrap();
        assert_eq!(listed[0].id, "b2");
        assert_eq!(listed[1].id, "b1");
    }

    #[tokio::test]
    async fn test_get_masks_foreign_boxes() {
        let pool = test_pool().await;
        seed_user(&pool, "u1", "a@b.c", "A").await;
        seed_user(&pool, "u2", "b@b.c", "B").await;
        let (_dir, service) = service(&pool).await;

        let theirs = service.create("u2", create_dto("Theirs")).await.unwrap();

        let err = service.get("u1", &theirs.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = service.get("u1", "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let pool = test_pool().await;
        seed_user(&pool, "u1", "a@b.c", "A").await;
        let (_dir, service) = service(&pool).await;

        let created = service.create("u1", create_dto("Before")).await.unwrap();
        let updated = service
            .update(
                "u1",
                &created.id,
                UpdateBoxDto {
                    name: "After".to_string(),
                    retention_date: Some("2030-01-01".to_string()),
                    status: Some(BoxStatus::Restricted),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "After");
        assert_eq!(updated.retention_date.as_deref(), Some("2030-01-01"));
        assert_eq!(updated.status, "restricted");

        let err = service
            .update(
                "u1",
                "missing",
                UpdateBoxDto {
                    name: "X".to_string(),
                    retention_date: None,
                    status: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_rows_and_files() {
        let pool = test_pool().await;
        seed_user(&pool, "u1", "a@b.c", "A").await;
        let (_dir, storage) = test_storage();
        let service = BoxService::new(pool.clone(), Arc::clone(&storage), "http://localhost".to_string());

        let created = service.create("u1", create_dto("Box")).await.unwrap();

        let key = LocalStore::generate_key("doc.pdf");
        storage.write(&key, b"%PDF-1.4").await.unwrap();
        sqlx::query(
            "INSERT INTO pdfs (id, title, filename, original_name, path, size, box_id)
             VALUES ('p1', 'Doc', ?, 'doc.pdf', ?, 8, ?)",
        )
        .bind(&key)
        .bind(&key)
        .bind(&created.id)
        .execute(&pool)
        .await
        .unwrap();

        service.delete("u1", &created.id).await.unwrap();

        assert!(!storage.exists(&key).await);
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pdfs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_qr_encodes_public_view_url() {
        let pool = test_pool().await;
        seed_user(&pool, "u1", "a@b.c", "A").await;
        let (_dir, service) = service(&pool).await;

        let created = service.create("u1", create_dto("Box")).await.unwrap();
        let qr = service.qr("u1", &created.id).await.unwrap();

        assert_eq!(qr.url, format!("http://localhost:3000/view/{}", created.id));
        assert!(qr.qr_code.starts_with("data:image/svg+xml;base64,"));

        let err = service.qr("u1", "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
