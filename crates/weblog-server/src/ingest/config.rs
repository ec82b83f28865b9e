//! Ingestion configuration
//!
//! Loaded from `INGEST_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{env_or, env_parse};

/// Default number of records per bulk request.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default directory for uploaded log files.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Default directory for file-backed job status records.
pub const DEFAULT_STATUS_DIR: &str = "status";

/// Default database for the sqlite status backend.
pub const DEFAULT_STATUS_DATABASE_URL: &str = "sqlite://status.db";

/// Default capacity of the queue's command channel.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default upload body limit (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Where job snapshots are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusBackend {
    /// One JSON file per job
    #[default]
    File,
    /// Rows in a sqlite database
    Sqlite,
}

impl std::str::FromStr for StatusBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "fs" => Ok(StatusBackend::File),
            "sqlite" => Ok(StatusBackend::Sqlite),
            _ => Err(anyhow::anyhow!("Invalid status backend: {}", s)),
        }
    }
}

/// Main ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Records per bulk request
    pub batch_size: usize,
    /// Where uploaded files are saved before ingestion
    pub upload_dir: PathBuf,
    pub status_backend: StatusBackend,
    /// Directory for the file backend
    pub status_dir: PathBuf,
    /// Connection URL for the sqlite backend
    pub status_database_url: String,
    /// Per-job time limit; `None` lets a job run until it finishes
    pub job_timeout_secs: Option<u64>,
    /// Capacity of the queue command channel
    pub queue_capacity: usize,
    /// Request body limit of the upload route
    pub max_upload_bytes: usize,
}

impl IngestConfig {
    /// Load from environment variables
    ///
    /// Values that are set but do not parse are rejected rather than defaulted.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            batch_size: env_or("INGEST_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            upload_dir: env_or("INGEST_UPLOAD_DIR", PathBuf::from(DEFAULT_UPLOAD_DIR))?,
            status_backend: env_or("INGEST_STATUS_BACKEND", StatusBackend::default())?,
            status_dir: env_or("INGEST_STATUS_DIR", PathBuf::from(DEFAULT_STATUS_DIR))?,
            status_database_url: env_or(
                "INGEST_STATUS_DATABASE_URL",
                DEFAULT_STATUS_DATABASE_URL.to_string(),
            )?,
            job_timeout_secs: env_parse::<u64>("INGEST_JOB_TIMEOUT_SECS")?.filter(|secs| *secs > 0),
            queue_capacity: env_or("INGEST_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?,
            max_upload_bytes: env_or("INGEST_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    /// Per-job time limit
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            status_backend: StatusBackend::File,
            status_dir: PathBuf::from(DEFAULT_STATUS_DIR),
            status_database_url: DEFAULT_STATUS_DATABASE_URL.to_string(),
            job_timeout_secs: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
