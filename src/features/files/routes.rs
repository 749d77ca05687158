use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::files::handlers;
use crate::features::files::services::FileService;

/// Create routes for the files feature
///
/// Note: this feature is public; possession of a storage key is the
/// capability to read the file
pub fn routes(service: Arc<FileService>) -> Router {
    Router::new()
        .route("/api/files/{key}", get(handlers::serve_file))
        .route("/api/files/{key}/download", get(handlers::download_file))
        .with_state(service)
}
