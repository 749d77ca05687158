use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::CurrentUser;
use crate::features::entries::dtos::{CreateTitleDto, EntryResponseDto, UploadPdfsForm};
use crate::features::entries::services::{EntryService, UploadedFile};
use crate::shared::constants::PDF_MIME_TYPE;
use crate::shared::types::MessageResponse;

/// Upload PDF files into a box
///
/// Accepts multipart/form-data with:
/// - `pdfs` (or `pdfs[]`): the files, repeatable
/// - `title` or `titles`: entry titles, repeatable; one title spread over
///   many files gets numbered suffixes
#[utoipa::path(
    post,
    path = "/api/boxes/{id}/pdfs",
    params(("id" = String, Path, description = "Box id")),
    request_body(
        content = UploadPdfsForm,
        content_type = "multipart/form-data",
        description = "PDF files plus title fields",
    ),
    responses(
        (status = 201, description = "Entries created", body = Vec<EntryResponseDto>),
        (status = 400, description = "Missing title, non-PDF file or too many files"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Box not found"),
        (status = 413, description = "File too large")
    ),
    tag = "entries",
    security(("bearer_auth" = []))
)]
pub async fn upload_pdfs(
    user: CurrentUser,
    State(service): State<Arc<EntryService>>,
    Path(box_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<EntryResponseDto>>)> {
    let mut files: Vec<UploadedFile> = Vec::new();
    let mut titles: Vec<String> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "pdfs" | "pdfs[]" => {
                let content_type = field.content_type().unwrap_or("").to_string();
                if content_type != PDF_MIME_TYPE {
                    return Err(AppError::BadRequest(
                        "Only PDF files are allowed".to_string(),
                    ));
                }

                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed.pdf".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                files.push(UploadedFile {
                    original_name,
                    data: data.to_vec(),
                });
            }
            "title" | "titles" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read title field: {}", e))
                })?;
                titles.push(text);
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let created = service.upload(&user.id, &box_id, titles, files).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Create a title-only entry (no file)
#[utoipa::path(
    post,
    path = "/api/boxes/{id}/titles",
    params(("id" = String, Path, description = "Box id")),
    request_body = CreateTitleDto,
    responses(
        (status = 201, description = "Entry created", body = EntryResponseDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Box not found")
    ),
    tag = "entries",
    security(("bearer_auth" = []))
)]
pub async fn create_title(
    user: CurrentUser,
    State(service): State<Arc<EntryService>>,
    Path(box_id): Path<String>,
    AppJson(dto): AppJson<CreateTitleDto>,
) -> Result<(StatusCode, Json<EntryResponseDto>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = service
        .create_title_only(&user.id, &box_id, &dto.title)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Delete one entry from a box
#[utoipa::path(
    delete,
    path = "/api/boxes/{id}/pdfs/{pdfId}",
    params(
        ("id" = String, Path, description = "Box id"),
        ("pdfId" = String, Path, description = "Entry id")
    ),
    responses(
        (status = 200, description = "Entry deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Box or entry not found")
    ),
    tag = "entries",
    security(("bearer_auth" = []))
)]
pub async fn delete_pdf(
    user: CurrentUser,
    State(service): State<Arc<EntryService>>,
    Path((box_id, pdf_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>> {
    service.delete(&user.id, &box_id, &pdf_id).await?;
    Ok(Json(MessageResponse {
        message: "Document deleted successfully".to_string(),
    }))
}
