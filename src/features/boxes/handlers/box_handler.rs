use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::CurrentUser;
use crate::features::boxes::dtos::{
    BoxDetailDto, BoxResponseDto, CreateBoxDto, QrCodeResponseDto, UpdateBoxDto,
};
use crate::features::boxes::services::BoxService;
use crate::shared::types::MessageResponse;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

/// List the authenticated user's boxes
#[utoipa::path(
    get,
    path = "/api/boxes",
    responses(
        (status = 200, description = "Boxes with entry counts, newest first", body = Vec<BoxResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "boxes",
    security(("bearer_auth" = []))
)]
pub async fn list_boxes(
    user: CurrentUser,
    State(service): State<Arc<BoxService>>,
) -> Result<Json<Vec<BoxResponseDto>>> {
    Ok(Json(service.list(&user.id).await?))
}

/// Get one box with its entries
#[utoipa::path(
    get,
    path = "/api/boxes/{id}",
    params(("id" = String, Path, description = "Box id")),
    responses(
        (status = 200, description = "Box detail", body = BoxDetailDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Box not found")
    ),
    tag = "boxes",
    security(("bearer_auth" = []))
)]
pub async fn get_box(
    user: CurrentUser,
    State(service): State<Arc<BoxService>>,
    Path(id): Path<String>,
) -> Result<Json<BoxDetailDto>> {
    Ok(Json(service.get(&user.id, &id).await?))
}

/// Create a box
#[utoipa::path(
    post,
    path = "/api/boxes",
    request_body = CreateBoxDto,
    responses(
        (status = 201, description = "Box created", body = BoxResponseDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "boxes",
    security(("bearer_auth" = []))
)]
pub async fn create_box(
    user: CurrentUser,
    State(service): State<Arc<BoxService>>,
    AppJson(dto): AppJson<CreateBoxDto>,
) -> Result<(StatusCode, Json<BoxResponseDto>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = service.create(&user.id, dto).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a box
#[utoipa::path(
    put,
    path = "/api/boxes/{id}",
    params(("id" = String, Path, description = "Box id")),
    request_body = UpdateBoxDto,
    responses(
        (status = 200, description = "Box updated", body = BoxResponseDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Box not found")
    ),
    tag = "boxes",
    security(("bearer_auth" = []))
)]
pub async fn update_box(
    user: CurrentUser,
    State(service): State<Arc<BoxService>>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<UpdateBoxDto>,
) -> Result<Json<BoxResponseDto>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(Json(service.update(&user.id, &id, dto).await?))
}

/// Delete a box, its entries and their files
#[utoipa::path(
    delete,
    path = "/api/boxes/{id}",
    params(("id" = String, Path, description = "Box id")),
    responses(
        (status = 200, description = "Box deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Box not found")
    ),
    tag = "boxes",
    security(("bearer_auth" = []))
)]
pub async fn delete_box(
    user: CurrentUser,
    State(service): State<Arc<BoxService>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    service.delete(&user.id, &id).await?;
    Ok(Json(MessageResponse {
        message: "Box deleted successfully".to_string(),
    }))
}

/// Get the QR code for a box's public view
#[utoipa::path(
    get,
    path = "/api/boxes/{id}/qr",
    params(("id" = String, Path, description = "Box id")),
    responses(
        (status = 200, description = "QR code as a base64 SVG data URL", body = QrCodeResponseDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Box not found")
    ),
    tag = "boxes",
    security(("bearer_auth" = []))
)]
pub async fn get_box_qr(
    user: CurrentUser,
    State(service): State<Arc<BoxService>>,
    Path(id): Path<String>,
) -> Result<Json<QrCodeResponseDto>> {
    Ok(Json(service.qr(&user.id, &id).await?))
}
