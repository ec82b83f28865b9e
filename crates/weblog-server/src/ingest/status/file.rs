//! File-backed status store
//!
//! One `ingest-status-<id>.json` per job. Each write goes to a uniquely named
//! temporary file in the same directory and is renamed over the target, so
//! readers in this or another process see either the old or the new snapshot.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

use super::StatusStore;
use crate::ingest::error::StatusError;
use crate::ingest::jobs::JobSnapshot;

/// Status records as JSON files in one directory
#[derive(Debug, Clone)]
pub struct FileStatusStore {
    dir: PathBuf,
}

impl FileStatusStore {
    /// Use `dir`, creating it if needed
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StatusError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `id`
    pub fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("ingest-status-{}.json", id))
    }
}

#[async_trait]
impl StatusStore for FileStatusStore {
    async fn write(&self, snapshot: &JobSnapshot) -> Result<(), StatusError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let target = self.path_for(snapshot.id);
        let tmp = self
            .dir
            .join(format!(".ingest-status-{}.{}.tmp", snapshot.id, Uuid::new_v4()));

        tokio::fs::write(&tmp, &bytes).await?;

        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temporary status file");
            }
            return Err(e.into());
        }

        Ok(())
    }

    async fn read(&self, id: Uuid) -> Result<Option<JobSnapshot>, StatusError> {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
