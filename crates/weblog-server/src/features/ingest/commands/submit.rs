//! Submit ingest command
//!
//! Queues an uploaded file for ingestion.

use mediator::Request;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::ingest::{JobQueueHandle, QueueError};

/// Name used when an upload carries no usable file name
pub const DEFAULT_UPLOAD_NAME: &str = "upload.log";

/// Command to queue a saved upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitIngestCommand {
    /// Where the upload was saved
    pub source_file: PathBuf,
    /// Stored file name reported back to the client
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitIngestResponse {
    pub message: String,
    pub file: String,
    pub job_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitIngestError {
    #[error("Failed to queue job: {0}")]
    Queue(#[from] QueueError),
}

impl Request<Result<SubmitIngestResponse, SubmitIngestError>> for SubmitIngestCommand {}

pub async fn handle(
    queue: JobQueueHandle,
    command: SubmitIngestCommand,
) -> Result<SubmitIngestResponse, SubmitIngestError> {
    let job_id = queue.submit(command.source_file).await?;

    Ok(SubmitIngestResponse {
        message: "File uploaded & ingestion queued".to_string(),
        file: command.file_name,
        job_id,
    })
}

/// Stored name for an upload: `<millis>-<base name>`
///
/// Directory components of the client-supplied name are dropped. A non-zero
/// `attempt` is inserted after the timestamp (`<millis>-<attempt>-<base name>`)
/// to step around a name that is already taken.
pub fn upload_file_name(original: &str, millis: i64, attempt: u32) -> String {
    let base = original
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or_default()
        .trim();

    let base = match base {
        "" | "." | ".." => DEFAULT_UPLOAD_NAME,
        name => name,
    };

    match attempt {
        0 => format!("{}-{}", millis, base),
        n => format!("{}-{}-{}", millis, n, base),
    }
}
