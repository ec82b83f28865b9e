//! Logs routes
//!
//! - `DELETE /reset` - delete the access-log index

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::delete,
    Json, Router,
};

use super::commands::{reset_index::handle as handle_reset, ResetIndexCommand, ResetIndexError};
use crate::error::AppError;
use crate::search::ElasticClient;

/// Create logs routes
pub fn logs_routes() -> Router<ElasticClient> {
    Router::new().route("/reset", delete(reset_index))
}

/// Delete the index
///
/// DELETE /reset
async fn reset_index(State(client): State<ElasticClient>) -> Result<Response, AppError> {
    let response = handle_reset(client, ResetIndexCommand).await?;

    tracing::info!(index = %response.index, "Index reset via API");

    Ok((StatusCode::OK, Json(response)).into_response())
}

impl From<ResetIndexError> for AppError {
    fn from(err: ResetIndexError) -> Self {
        match err {
            ResetIndexError::NotFound => AppError::NotFound("Index does not exist".to_string()),
            ResetIndexError::Search(e) => AppError::Search(e),
        }
    }
}
