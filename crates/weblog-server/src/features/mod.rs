//! Feature modules implementing the weblog API
//!
//! Each feature is a vertical slice with its own commands, queries and routes.
//!
//! # Features
//!
//! - **ingest**: upload a log file, poll job status, inspect the queue
//! - **logs**: administration of the access-log index
//!
//! Commands and queries implement the mediator pattern using the `mediator` crate.

pub mod ingest;
pub mod logs;

use axum::Router;
use std::path::PathBuf;

use crate::ingest::JobQueueHandle;
use crate::search::ElasticClient;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Submission and status access for ingestion jobs
    pub queue: JobQueueHandle,
    /// Search store client for index administration and health
    pub elastic: ElasticClient,
    /// Where uploaded files are written before ingestion
    pub upload_dir: PathBuf,
    /// Request body limit of the upload route
    pub max_upload_bytes: usize,
}

/// Creates the API router with all feature routes mounted
///
/// - `/ingest` - Upload, job status and queue inspection
/// - `/logs` - Index reset
pub fn router(state: FeatureState) -> Router<()> {
    let ingest_state = ingest::IngestState {
        queue: state.queue.clone(),
        upload_dir: state.upload_dir.clone(),
    };

    Router::new()
        .nest(
            "/ingest",
            ingest::ingest_routes(state.max_upload_bytes).with_state(ingest_state),
        )
        .nest("/logs", logs::logs_routes().with_state(state.elastic))
}
