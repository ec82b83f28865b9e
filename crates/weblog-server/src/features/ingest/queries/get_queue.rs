//! Get queue query

use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::ingest::{JobQueueHandle, QueueError, QueueSnapshot};

/// Query for the running and pending job ids
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetQueueQuery;

#[derive(Debug, thiserror::Error)]
pub enum GetQueueError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl Request<Result<QueueSnapshot, GetQueueError>> for GetQueueQuery {}

pub async fn handle(queue: JobQueueHandle, _query: GetQueueQuery) -> Result<QueueSnapshot, GetQueueError> {
    Ok(queue.snapshot().await?)
}
