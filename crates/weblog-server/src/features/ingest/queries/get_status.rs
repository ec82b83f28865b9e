//! Get ingest status query
//!
//! Query to get the latest snapshot of one job.

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ingest::{JobQueueHandle, JobSnapshot, QueueError};

/// Query to get a job snapshot by ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetIngestStatusQuery {
    pub job_id: String,
}

/// Error type for get ingest status query
#[derive(Debug, thiserror::Error)]
pub enum GetIngestStatusError {
    #[error("Job not found")]
    NotFound,
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl Request<Result<JobSnapshot, GetIngestStatusError>> for GetIngestStatusQuery {}

pub async fn handle(
    queue: JobQueueHandle,
    query: GetIngestStatusQuery,
) -> Result<JobSnapshot, GetIngestStatusError> {
    // Ids are only ever issued as UUIDs, anything else was never submitted
    let id = Uuid::parse_str(&query.job_id).map_err(|_| GetIngestStatusError::NotFound)?;

    queue
        .status(id)
        .await?
        .ok_or(GetIngestStatusError::NotFound)
}
