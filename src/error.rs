//! Error handling

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::inference::InferenceError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client input errors
    #[error("No file uploaded")]
    NoFile,

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("{0}")]
    Validation(String),

    #[error("Upload exceeds the maximum allowed size")]
    PayloadTooLarge,

    // Resource errors
    #[error("{0}")]
    NotFound(String),

    // Model errors
    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Inference failed: {0}")]
    Inference(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoFile
            | AppError::InvalidFileType(_)
            | AppError::InvalidImage(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Inference(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match &self {
            AppError::Inference(msg) => {
                tracing::error!("Inference error: {}", msg);
                "Inference failed".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::ModelUnavailable => {
                tracing::warn!("Request rejected, model not loaded");
                self.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        AppError::Inference(err.to_string())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(err: MultipartRejection) -> Self {
        tracing::debug!("Multipart rejected: {}", err.body_text());
        AppError::NoFile
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::Validation(format!("Malformed multipart body: {}", err.body_text()))
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Worker task failed: {}", err))
    }
}
