use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::export::ExportError;
use crate::generation::llm::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Mail delivery failed: {0}")]
    Delivery(anyhow::Error),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Generation error: {0}")]
    Generation(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::NOT_ACCEPTABLE,
                "INVALID_CREDENTIALS",
                "Invalid credentials.".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Delivery(e) => {
                tracing::error!("Mail delivery failed: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DELIVERY_FAILED",
                    "Failed to send OTP.".to_string(),
                )
            }
            AppError::Export(e) => match e {
                ExportError::MarkerMissing => (
                    StatusCode::NOT_FOUND,
                    "EXPORT_FAILED",
                    "Resume content not found".to_string(),
                ),
                ExportError::Busy => (
                    StatusCode::CONFLICT,
                    "EXPORT_IN_PROGRESS",
                    "An export of this resume is already running".to_string(),
                ),
                other => {
                    tracing::error!("Export error: {other}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "EXPORT_FAILED",
                        "Failed to download PDF. Please try the print option.".to_string(),
                    )
                }
            },
            AppError::Generation(LlmError::NotConfigured) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "GENERATION_UNAVAILABLE",
                "AI generation is not configured on this server.".to_string(),
            ),
            AppError::Generation(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_FAILED",
                    "Failed to generate summary. Please ensure inputs are clear and try again."
                        .to_string(),
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
