//! Schema initialization and one-time structural migration.
//!
//! Runs on every startup and is idempotent. Older deployments created the
//! `pdfs` table without a `title` column and with `filename NOT NULL`;
//! `migrate_legacy_pdfs` rewrites that shape in a single transaction,
//! backfilling titles from the best available legacy field.

use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    password TEXT NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

const CREATE_BOXES: &str = r#"
CREATE TABLE IF NOT EXISTS boxes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    user_id TEXT NOT NULL,
    retention_date TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
)
"#;

const CREATE_PDFS: &str = r#"
CREATE TABLE IF NOT EXISTS pdfs (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    filename TEXT,
    original_name TEXT,
    path TEXT,
    size INTEGER DEFAULT 0,
    box_id TEXT NOT NULL,
    upload_date DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (box_id) REFERENCES boxes (id) ON DELETE CASCADE
)
"#;

const CREATE_PDFS_NEW: &str = r#"
CREATE TABLE IF NOT EXISTS pdfs_new (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    filename TEXT,
    original_name TEXT,
    path TEXT,
    size INTEGER DEFAULT 0,
    box_id TEXT NOT NULL,
    upload_date DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (box_id) REFERENCES boxes (id) ON DELETE CASCADE
)
"#;

const CREATE_LICENSE_CODES: &str = r#"
CREATE TABLE IF NOT EXISTS license_codes (
    code TEXT PRIMARY KEY,
    max_uses INTEGER NOT NULL,
    current_uses INTEGER NOT NULL DEFAULT 0
)
"#;

const CREATE_LICENSE_USAGE: &str = r#"
CREATE TABLE IF NOT EXISTS license_usage (
    id TEXT PRIMARY KEY,
    license_code TEXT NOT NULL,
    user_id TEXT NOT NULL,
    used_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_boxes_user_id ON boxes (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_pdfs_box_id ON pdfs (box_id)",
    "CREATE INDEX IF NOT EXISTS idx_pdfs_path ON pdfs (path)",
    "CREATE INDEX IF NOT EXISTS idx_users_email ON users (email)",
];

/// One row of `PRAGMA table_info(...)` output.
#[derive(Debug, FromRow)]
struct TableColumn {
    name: String,
    notnull: i64,
}

/// Ensure all tables and indexes exist, then migrate a legacy `pdfs` shape
/// if one is present. Safe to run on every startup.
///
/// Migration failures are logged and swallowed: the server keeps serving
/// with whatever schema exists rather than refusing to start.
pub async fn initialize(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for ddl in [
        CREATE_USERS,
        CREATE_BOXES,
        CREATE_PDFS,
        CREATE_LICENSE_CODES,
        CREATE_LICENSE_USAGE,
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }

    for ddl in INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    if let Err(e) = migrate_legacy_pdfs(pool).await {
        tracing::error!(
            "pdfs schema migration failed: {}; continuing with existing schema",
            e
        );
    }

    tracing::info!("Database tables initialized");
    Ok(())
}

async fn migrate_legacy_pdfs(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let columns = sqlx::query_as::<_, TableColumn>("PRAGMA table_info(pdfs)")
        .fetch_all(pool)
        .await?;

    let has_title = columns.iter().any(|c| c.name == "title");
    let filename_not_null = columns
        .iter()
        .any(|c| c.name == "filename" && c.notnull != 0);

    if has_title && !filename_not_null {
        tracing::debug!("pdfs schema is up to date");
        return Ok(());
    }

    tracing::info!("Migrating pdfs table to title-bearing schema");

    // Backfill title from the best available legacy field; every other
    // column is carried over unchanged.
    let copy = if has_title {
        r#"
        INSERT INTO pdfs_new (id, title, filename, original_name, path, size, box_id, upload_date)
        SELECT id,
               COALESCE(NULLIF(title, ''), filename, original_name, 'Untitled'),
               filename, original_name, path, COALESCE(size, 0), box_id, upload_date
        FROM pdfs
        "#
    } else {
        r#"
        INSERT INTO pdfs_new (id, title, filename, original_name, path, size, box_id, upload_date)
        SELECT id,
               COALESCE(filename, original_name, 'Untitled'),
               filename, original_name, path, COALESCE(size, 0), box_id, upload_date
        FROM pdfs
        "#
    };

    let mut tx = pool.begin().await?;
    sqlx::query(CREATE_PDFS_NEW).execute(&mut *tx).await?;
    sqlx::query(copy).execute(&mut *tx).await?;
    sqlx::query("DROP TABLE pdfs").execute(&mut *tx).await?;
    sqlx::query("ALTER TABLE pdfs_new RENAME TO pdfs")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_pdfs_box_id ON pdfs (box_id)")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_pdfs_path ON pdfs (path)")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("pdfs schema migration completed");
    Ok(())
}
