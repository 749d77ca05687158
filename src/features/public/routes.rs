use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::public::handlers;
use crate::features::public::services::PublicService;

/// Create routes for the public feature
///
/// Note: this feature is public (no authentication required)
pub fn routes(service: Arc<PublicService>) -> Router {
    Router::new()
        .route("/api/public/boxes/{id}", get(handlers::get_public_box))
        .route(
            "/api/public/boxes/{id}/stats",
            get(handlers::get_public_box_stats),
        )
        .with_state(service)
}
