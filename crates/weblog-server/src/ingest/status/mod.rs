//! Job status persistence
//!
//! A [`StatusStore`] keeps the last written [`JobSnapshot`] per job id. Writes are
//! whole-snapshot replacements, and a reader never observes a half-written record.

pub mod file;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::config::{IngestConfig, StatusBackend};
use super::error::StatusError;
use super::jobs::JobSnapshot;

pub use file::FileStatusStore;
pub use memory::MemoryStatusStore;
pub use sqlite::SqliteStatusStore;

/// Keyed store of job snapshots
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Replace the snapshot stored under `snapshot.id`
    async fn write(&self, snapshot: &JobSnapshot) -> Result<(), StatusError>;

    /// Last written snapshot, or `None` if the id was never written
    async fn read(&self, id: Uuid) -> Result<Option<JobSnapshot>, StatusError>;
}

/// Open the backend selected by configuration
pub async fn open(config: &IngestConfig) -> Result<Arc<dyn StatusStore>, StatusError> {
    match config.status_backend {
        StatusBackend::File => Ok(Arc::new(FileStatusStore::open(&config.status_dir).await?)),
        StatusBackend::Sqlite => {
            Ok(Arc::new(SqliteStatusStore::connect(&config.status_database_url).await?))
        },
    }
}
