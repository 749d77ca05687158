use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;

use crate::core::error::{AppError, Result};
use crate::features::entries::dtos::EntryResponseDto;
use crate::features::entries::models::Entry;
use crate::features::public::dtos::{BoxStatsDto, PublicBoxDto};

#[derive(Debug, FromRow)]
struct PublicBoxRow {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    owner_name: String,
}

#[derive(Debug, FromRow)]
struct StatsRow {
    total_entries: i64,
    total_size: i64,
    first_upload: Option<DateTime<Utc>>,
    last_upload: Option<DateTime<Utc>>,
}

/// Read-only service behind the unauthenticated box view. Looks up boxes
/// by bare id; the id itself is the capability.
pub struct PublicService {
    pool: SqlitePool,
}

impl PublicService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the public projection of a box with its entries.
    pub async fn get_public_box(&self, box_id: &str) -> Result<PublicBoxDto> {
        let row = sqlx::query_as::<_, PublicBoxRow>(
            r#"
            SELECT b.id, b.name, b.created_at, u.name AS owner_name
            FROM boxes b
            JOIN users u ON u.id = b.user_id
            WHERE b.id = ?
            "#,
        )
        .bind(box_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Box not found".to_string()))?;

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

        let pdfs: Vec<EntryResponseDto> = entries.into_iter().map(Into::into).collect();
        Ok(PublicBoxDto {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            owner_name: row.owner_name,
            pdf_count: pdfs.len() as i64,
            pdfs,
        })
    }

    /// Aggregate entry stats for a box.
    pub async fn stats(&self, box_id: &str) -> Result<BoxStatsDto> {
        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM boxes WHERE id = ?")
            .bind(box_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("Box not found".to_string()));
        }

        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT COUNT(*) AS total_entries,
                   COALESCE(SUM(COALESCE(size, 0)), 0) AS total_size,
                   MIN(upload_date) AS first_upload,
                   MAX(upload_date) AS last_upload
            FROM pdfs
            WHERE box_id = ?
            "#,
        )
        .bind(box_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(BoxStatsDto {
            box_id: box_id.to_string(),
            total_entries: row.total_entries,
            total_size: row.total_size,
            first_upload: row.first_upload,
            last_upload: row.last_upload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{seed_user, test_pool};

    async fn seed_box_with_entries(pool: &SqlitePool) {
        seed_user(pool, "u1", "a@b.c", "Alice").await;
        sqlx::query(
            "INSERT INTO boxes (id, name, user_id, retention_date, status, created_at)
             VALUES ('b1', 'Public Box', 'u1', '2030-01-01', 'restricted', '2024-01-01 09:00:00')",
        )
        .execute(pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO pdfs (id, title, filename, original_name, path, size, box_id, upload_date)
             VALUES ('p1', 'Doc 1', 'k1.pdf', 'doc1.pdf', 'k1.pdf', 100, 'b1', '2024-02-01 10:00:00')",
        )
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO pdfs (id, title, box_id, size, upload_date)
             VALUES ('p2', 'Title only', 'b1', 0, '2024-03-01 10:00:00')",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_public_view_is_reduced_projection() {
        let pool = test_pool().await;
        seed_box_with_entries(&pool).await;
        let service = PublicService::new(pool);

        let view = service.get_public_box("b1").await.unwrap();
        assert_eq!(view.name, "Public Box");
        assert_eq!(view.owner_name, "Alice");
        assert_eq!(view.pdf_count, 2);
        assert_eq!(view.pdfs.len(), 2);

        // Serialized form must not leak retention or status
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("retentionDate").is_none());
        assert!(json.get("status").is_none());
    }

    #[tokio::test]
    async fn test_unknown_box_is_not_found() {
        let pool = test_pool().await;
        let service = PublicService::new(pool);

        assert!(matches!(
            service.get_public_box("missing").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.stats("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_aggregates_entries() {
        let pool = test_pool().await;
        seed_box_with_entries(&pool).await;
        let service = PublicService::new(pool);

        let stats = service.stats("b1").await.unwrap();
        assert_eq!(stats.box_id, "b1");
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.total_size, 100);
        assert!(stats.first_upload.unwrap() < stats.last_upload.unwrap());
    }

    #[tokio::test]
    async fn test_stats_for_empty_box() {
        let pool = test_pool().await;
        seed_user(&pool, "u1", "a@b.c", "Alice").await;
        sqlx::query("INSERT INTO boxes (id, name, user_id) VALUES ('b1', 'Empty', 'u1')")
            .execute(&pool)
            .await
            .unwrap();
        let service = PublicService::new(pool);

        let stats = service.stats("b1").await.unwrap();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_size, 0);
        assert_eq!(stats.first_upload, None);
        assert_eq!(stats.last_upload, None);
    }
}
