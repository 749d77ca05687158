//! Local filesystem store for uploaded PDF content.
//!
//! Files live flat in one directory under generated keys of the form
//! `{uuid}-{millis}{ext}`. Key generation is the only collision defense;
//! there is no cross-request locking.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::core::error::{AppError, Result};

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the content directory if it does not exist.
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create upload directory {}: {}",
                self.root.display(),
                e
            ))
        })
    }

    /// Generate a fresh storage key, preserving the original extension.
    pub fn generate_key(original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        format!("{}-{}{}", Uuid::new_v4(), Utc::now().timestamp_millis(), ext)
    }

    /// Resolve a key to a path inside the root. Keys are flat generated
    /// names; anything that could escape the directory is treated as
    /// nonexistent rather than invalid, so probing leaks nothing.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(AppError::NotFound("File not found".to_string()));
        }
        Ok(self.root.join(key))
    }

    pub async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write {}: {}", key, e)))
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(AppError::Internal(format!("Failed to read {}: {}", key, e))),
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.resolve(key) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Delete the file behind a key. Missing files are not an error; a
    /// deleted row must never fail because its file is already gone.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!(
                "Failed to delete {}: {}",
                key, e
            ))),
        }
    }

    /// Best-effort delete used by cleanup paths: failures are logged, never
    /// propagated.
    pub async fn delete_quietly(&self, key: &str) {
        if let Err(e) = self.delete(key).await {
            warn!("Failed to delete file '{}': {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key_keeps_extension() {
        let key = LocalStore::generate_key("report.pdf");
        assert!(key.ends_with(".pdf"));
        assert!(!key.contains('/'));

        let bare = LocalStore::generate_key("no-extension");
        assert!(!bare.contains('.'));
    }

    #[test]
    fn test_generate_keys_are_unique() {
        let a = LocalStore::generate_key("a.pdf");
        let b = LocalStore::generate_key("a.pdf");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_write_read_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store.write("k1.pdf", b"content").await.unwrap();
        assert!(store.exists("k1.pdf").await);
        assert_eq!(store.read("k1.pdf").await.unwrap(), b"content");

        store.delete("k1.pdf").await.unwrap();
        assert!(!store.exists("k1.pdf").await);
        // Deleting again is not an error
        store.delete("k1.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        match store.read("missing.pdf").await {
            Err(AppError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        for key in ["../etc/passwd", "a/b.pdf", "a\\b.pdf", "", ".."] {
            assert!(!store.exists(key).await);
            assert!(matches!(
                store.read(key).await,
                Err(AppError::NotFound(_))
            ));
        }
    }
}
