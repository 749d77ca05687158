use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, post},
    Router,
};

use crate::features::entries::handlers;
use crate::features::entries::services::EntryService;

/// Create routes for the entries feature (all require authentication).
/// `body_limit` bounds a whole multipart request body.
pub fn routes(service: Arc<EntryService>, body_limit: usize) -> Router {
    Router::new()
        .route("/api/boxes/{id}/pdfs", post(handlers::upload_pdfs))
        .route("/api/boxes/{id}/titles", post(handlers::create_title))
        .route("/api/boxes/{id}/pdfs/{pdfId}", delete(handlers::delete_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}
