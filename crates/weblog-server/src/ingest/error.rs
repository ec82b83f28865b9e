//! Ingestion error types

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::search::SearchError;

/// Why a job ended in `error`
///
/// The `Display` text becomes the job's `error_message`.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index setup failed: {0}")]
    IndexSetup(#[source] SearchError),

    #[error("bulk write failed: {0}")]
    Backend(#[from] SearchError),

    #[error("status update failed: {0}")]
    Status(#[from] StatusError),

    #[error("job timed out after {0:?}")]
    Timeout(Duration),

    #[error("worker crashed: {0}")]
    WorkerCrashed(String),

    #[error("parser setup failed: {0}")]
    Parser(#[from] weblog_common::WeblogError),
}

/// Status store failures
#[derive(Error, Debug)]
pub enum StatusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt status record: {0}")]
    Corrupt(String),
}

/// Errors from the queue handle
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("job queue is shut down")]
    Shutdown,

    #[error(transparent)]
    Status(#[from] StatusError),
}
