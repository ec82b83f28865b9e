//! Error types shared across the weblog workspace

use thiserror::Error;

/// Result type alias for weblog operations
pub type Result<T> = std::result::Result<T, WeblogError>;

/// Main error type for weblog
#[derive(Error, Debug)]
pub enum WeblogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
