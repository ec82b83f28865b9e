//! Bulk-write seam between the pipeline and the search store

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use weblog_common::LogRecord;

use super::error::SearchError;

/// Durability of a bulk write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Refresh {
    /// Written, not necessarily searchable yet
    False,
    /// Searchable as soon as the call returns
    True,
}

impl Refresh {
    /// Value of the `refresh` query parameter
    pub fn as_str(self) -> &'static str {
        match self {
            Refresh::False => "false",
            Refresh::True => "true",
        }
    }

    pub fn is_durable(self) -> bool {
        self == Refresh::True
    }
}

/// Outcome of one accepted bulk request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BulkSummary {
    /// Documents in the request
    pub items: usize,
    /// Documents the store refused individually
    pub rejected: usize,
}

/// Destination for batches of parsed records
///
/// A returned error means the whole batch must be treated as not written.
#[async_trait]
pub trait BulkSink: Send + Sync {
    /// Called once before a job writes its first batch
    async fn prepare(&self) -> Result<(), SearchError> {
        Ok(())
    }

    /// Write `records` in order as one request
    async fn bulk(&self, records: &[LogRecord], refresh: Refresh)
        -> Result<BulkSummary, SearchError>;
}

#[async_trait]
impl<S: BulkSink + ?Sized> BulkSink for Arc<S> {
    async fn prepare(&self) -> Result<(), SearchError> {
        (**self).prepare().await
    }

    async fn bulk(
        &self,
        records: &[LogRecord],
        refresh: Refresh,
    ) -> Result<BulkSummary, SearchError> {
        (**self).bulk(records, refresh).await
    }
}

/// One recorded bulk request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCall {
    pub records: Vec<LogRecord>,
    pub refresh: Refresh,
}

#[derive(Debug, Default)]
struct MemorySinkState {
    calls: Vec<BulkCall>,
    attempts: usize,
    fail_on_attempt: Option<usize>,
}

/// In-memory sink that records every accepted call
///
/// Clones share the same recording.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemorySinkState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose `attempt`-th bulk call (1-based) fails with a 503
    pub fn failing_on(attempt: usize) -> Self {
        let sink = Self::default();
        sink.lock().fail_on_attempt = Some(attempt);
        sink
    }

    /// Accepted calls in order
    pub fn calls(&self) -> Vec<BulkCall> {
        self.lock().calls.clone()
    }

    /// All records accepted so far, in write order
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock()
            .calls
            .iter()
            .flat_map(|call| call.records.iter().cloned())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySinkState> {
        // A poisoned lock only means another test thread panicked mid-call
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BulkSink for MemorySink {
    async fn bulk(
        &self,
        records: &[LogRecord],
        refresh: Refresh,
    ) -> Result<BulkSummary, SearchError> {
        let mut state = self.lock();
        state.attempts += 1;

        if state.fail_on_attempt == Some(state.attempts) {
            return Err(SearchError::Status {
                status: 503,
                body: "simulated outage".to_string(),
            });
        }

        state.calls.push(BulkCall {
            records: records.to_vec(),
            refresh,
        });

        Ok(BulkSummary {
            items: records.len(),
            rejected: 0,
        })
    }
}
