use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ErrorBody;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    internal_message(&format!("{:?}", e)),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "Validation failed", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", msg),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    internal_message(msg),
                )
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Access denied", msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Access denied", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", msg),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large", msg)
            }
            AppError::RateLimitExceeded(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, "Too many requests", msg)
            }
        };

        let body = Json(ErrorBody {
            error: error.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Unexpected failures are logged with full detail server-side; the client
/// only sees it in debug builds.
fn internal_message(detail: &str) -> String {
    if cfg!(debug_assertions) {
        detail.to_string()
    } else {
        "An unexpected error occurred".to_string()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
