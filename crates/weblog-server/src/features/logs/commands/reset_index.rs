//! Reset index command
//!
//! Deletes the access-log index. The next ingestion job recreates it with the
//! current mapping.

use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::search::{ElasticClient, SearchError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetIndexCommand;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetIndexResponse {
    pub message: String,
    pub index: String,
    pub acknowledged: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ResetIndexError {
    #[error("Index does not exist")]
    NotFound,
    #[error("Search store error: {0}")]
    Search(#[from] SearchError),
}

impl Request<Result<ResetIndexResponse, ResetIndexError>> for ResetIndexCommand {}

pub async fn handle(
    client: ElasticClient,
    _command: ResetIndexCommand,
) -> Result<ResetIndexResponse, ResetIndexError> {
    if !client.delete_index().await? {
        return Err(ResetIndexError::NotFound);
    }

    Ok(ResetIndexResponse {
        message: "Index deleted successfully".to_string(),
        index: client.index().to_string(),
        acknowledged: true,
    })
}
