//! In-process status store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::StatusStore;
use crate::ingest::error::StatusError;
use crate::ingest::jobs::JobSnapshot;

/// Snapshots kept in a map; lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    snapshots: RwLock<HashMap<Uuid, JobSnapshot>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn write(&self, snapshot: &JobSnapshot) -> Result<(), StatusError> {
        self.snapshots.write().await.insert(snapshot.id, snapshot.clone());
        Ok(())
    }

    async fn read(&self, id: Uuid) -> Result<Option<JobSnapshot>, StatusError> {
        Ok(self.snapshots.read().await.get(&id).cloned())
    }
}
