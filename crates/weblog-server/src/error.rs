//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingest::{QueueError, StatusError};
use crate::search::SearchError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Search store error: {0}")]
    Search(#[from] SearchError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Status store error: {0}")]
    Status(#[from] StatusError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(ref message) => (StatusCode::NOT_FOUND, message.clone()),
            AppError::BadRequest(ref message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::PayloadTooLarge(ref message) => {
                (StatusCode::PAYLOAD_TOO_LARGE, message.clone())
            },
            AppError::Search(ref e) => {
                tracing::error!("Search store error: {:?}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            },
            AppError::Queue(QueueError::Shutdown) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Ingestion queue is shutting down".to_string(),
            ),
            AppError::Queue(QueueError::Status(ref e)) | AppError::Status(ref e) => {
                tracing::error!("Status store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "A status store error occurred".to_string())
            },
            AppError::Io(ref e) => {
                tracing::error!("IO error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "An IO error occurred".to_string())
            },
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
            },
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}
