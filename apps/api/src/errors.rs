use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::screenplay::FormatError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Formatting error: {0}")]
    Format(#[from] FormatError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Format(e @ FormatError::Encoding { .. }) => {
                tracing::warn!("Screenplay encoding error: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "ENCODING_ERROR",
                    e.to_string(),
                )
            }
            AppError::Format(e @ FormatError::ImageIo(_)) => {
                tracing::error!("Storyboard image error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IMAGE_IO_ERROR",
                    "The storyboard image could not be embedded".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
