use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::Result;
use crate::core::extractor::MaybeUser;
use crate::features::public::dtos::{BoxStatsDto, PublicBoxDto};
use crate::features::public::services::PublicService;

/// View a box without authentication
#[utoipa::path(
    get,
    path = "/api/public/boxes/{id}",
    params(("id" = String, Path, description = "Box id")),
    responses(
        (status = 200, description = "Public box view", body = PublicBoxDto),
        (status = 404, description = "Box not found")
    ),
    tag = "public"
)]
pub async fn get_public_box(
    MaybeUser(user): MaybeUser,
    State(service): State<Arc<PublicService>>,
    Path(id): Path<String>,
) -> Result<Json<PublicBoxDto>> {
    if let Some(user) = &user {
        debug!("Authenticated user {} viewing public box {}", user.id, id);
    }
    Ok(Json(service.get_public_box(&id).await?))
}

/// Aggregate stats for a public box view
#[utoipa::path(
    get,
    path = "/api/public/boxes/{id}/stats",
    params(("id" = String, Path, description = "Box id")),
    responses(
        (status = 200, description = "Box stats", body = BoxStatsDto),
        (status = 404, description = "Box not found")
    ),
    tag = "public"
)]
pub async fn get_public_box_stats(
    State(service): State<Arc<PublicService>>,
    Path(id): Path<String>,
) -> Result<Json<BoxStatsDto>> {
    Ok(Json(service.stats(&id).await?))
}
