use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::files::services::FileService;
use crate::shared::constants::PDF_MIME_TYPE;

/// Serve a stored PDF inline
#[utoipa::path(
    get,
    path = "/api/files/{key}",
    params(("key" = String, Path, description = "Storage key")),
    responses(
        (status = 200, description = "PDF content", content_type = "application/pdf"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn serve_file(
    State(service): State<Arc<FileService>>,
    Path(key): Path<String>,
) -> Result<Response> {
    let file = service.fetch(&key).await?;
    respond(file.data, &file.original_name, "inline")
}

/// Download a stored PDF as an attachment
#[utoipa::path(
    get,
    path = "/api/files/{key}/download",
    params(("key" = String, Path, description = "Storage key")),
    responses(
        (status = 200, description = "PDF content", content_type = "application/pdf"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(service): State<Arc<FileService>>,
    Path(key): Path<String>,
) -> Result<Response> {
    let file = service.fetch(&key).await?;
    respond(file.data, &file.original_name, "attachment")
}

fn respond(data: Vec<u8>, original_name: &str, disposition: &str) -> Result<Response> {
    // Quotes and control characters would corrupt the header value
    let safe_name: String = original_name
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PDF_MIME_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("{}; filename=\"{}\"", disposition, safe_name),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Failed to build file response: {}", e)))
}
