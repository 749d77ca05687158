use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::boxes::handlers;
use crate::features::boxes::services::BoxService;

/// Create routes for the boxes feature (all require authentication)
pub fn routes(service: Arc<BoxService>) -> Router {
    Router::new()
        .route(
            "/api/boxes",
            get(handlers::list_boxes).post(handlers::create_box),
        )
        .route(
            "/api/boxes/{id}",
            get(handlers::get_box)
                .put(handlers::update_box)
                .delete(handlers::delete_box),
        )
        .route("/api/boxes/{id}/qr", get(handlers::get_box_qr))
        .with_state(service)
}
