//! Search-store client errors

use thiserror::Error;

/// Errors talking to the external search store
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid search store response: {0}")]
    InvalidResponse(String),

    #[error("failed to encode bulk body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SearchError {
    /// True for a 404 from the store
    pub fn is_not_found(&self) -> bool {
        matches!(self, SearchError::Status { status: 404, .. })
    }
}
