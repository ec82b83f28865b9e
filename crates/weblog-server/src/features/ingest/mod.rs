//! Ingest feature module
//!
//! Accepts log file uploads, queues them for ingestion and exposes job progress.

pub mod commands;
pub mod queries;
pub mod routes;

use std::path::PathBuf;

use crate::ingest::JobQueueHandle;

pub use routes::ingest_routes;

/// State for ingest routes
#[derive(Clone)]
pub struct IngestState {
    pub queue: JobQueueHandle,
    pub upload_dir: PathBuf,
}
