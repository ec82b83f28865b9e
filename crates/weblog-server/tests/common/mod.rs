//! Shared helpers for weblog-server integration tests
//!
//! - Access-log line generators and temp-file writers
//! - Sinks that block, panic or record for exercising the queue
//! - A status store that records every write, and one that fails on demand

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use uuid::Uuid;
use weblog_common::LogRecord;
use weblog_server::ingest::{
    JobQueueHandle, JobSnapshot, JobStatus, MemoryStatusStore, StatusError, StatusStore,
};
use weblog_server::search::{BulkSink, BulkSummary, MemorySink, Refresh, SearchError};

/// A valid combined-format line; `i` shows up in the URL and byte count
pub fn log_line(i: usize) -> String {
    format!(
        r#"10.0.{}.{} - - [22/Jan/2019:03:56:{:02} +0330] "GET /product/{} HTTP/1.1" 200 {} "-" "Mozilla/5.0 (X11; Linux x86_64)""#,
        (i / 256) % 256,
        i % 256,
        i % 60,
        i,
        100 + i
    )
}

/// `total` lines where the indices in `bad` are garbage
pub fn lines_with_bad(total: usize, bad: &[usize]) -> Vec<String> {
    (0..total)
        .map(|i| {
            if bad.contains(&i) {
                format!("garbage line {}", i)
            } else {
                log_line(i)
            }
        })
        .collect()
}

/// Write `lines` newline-terminated to `dir/name`
pub fn write_log(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    let mut body = lines.join("\n");
    body.push('\n');
    std::fs::write(&path, body).expect("write log file");
    path
}

/// Poll until the job is completed or errored
pub async fn wait_for_terminal(queue: &JobQueueHandle, id: Uuid) -> JobSnapshot {
    wait_for(queue, id, |s| s.is_terminal()).await
}

/// Poll until the job's snapshot satisfies `done`
pub async fn wait_for<F>(queue: &JobQueueHandle, id: Uuid, done: F) -> JobSnapshot
where
    F: Fn(&JobSnapshot) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(snapshot) = queue.status(id).await.expect("read status") {
            if done(&snapshot) {
                return snapshot;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {} did not reach the expected state in time",
            id
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Sink whose bulk calls wait for a permit
///
/// Starts closed; [`GatedSink::open`] lets calls through.
#[derive(Clone)]
pub struct GatedSink {
    inner: MemorySink,
    gate: Arc<Semaphore>,
}

impl GatedSink {
    pub fn closed() -> Self {
        Self {
            inner: MemorySink::new(),
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    /// Let `calls` more bulk calls through
    pub fn open(&self, calls: usize) {
        self.gate.add_permits(calls);
    }

    pub fn open_all(&self) {
        self.gate.add_permits(1_000_000);
    }

    pub fn recorded(&self) -> &MemorySink {
        &self.inner
    }
}

#[async_trait]
impl BulkSink for GatedSink {
    async fn bulk(
        &self,
        records: &[LogRecord],
        refresh: Refresh,
    ) -> Result<BulkSummary, SearchError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| SearchError::InvalidResponse("gate closed".to_string()))?;
        permit.forget();
        self.inner.bulk(records, refresh).await
    }
}

/// Sink that panics on its `n`-th call (1-based) and records the rest
#[derive(Clone)]
pub struct PanickingSink {
    inner: MemorySink,
    calls: Arc<Mutex<usize>>,
    panic_on: usize,
    panicked: Arc<AtomicBool>,
}

impl PanickingSink {
    pub fn on_call(panic_on: usize) -> Self {
        Self {
            inner: MemorySink::new(),
            calls: Arc::new(Mutex::new(0)),
            panic_on,
            panicked: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn recorded(&self) -> &MemorySink {
        &self.inner
    }
}

#[async_trait]
impl BulkSink for PanickingSink {
    async fn bulk(
        &self,
        records: &[LogRecord],
        refresh: Refresh,
    ) -> Result<BulkSummary, SearchError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };

        if call == self.panic_on && !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("sink exploded on call {}", call);
        }

        self.inner.bulk(records, refresh).await
    }
}

/// Status store that keeps every write and tracks concurrently running jobs
#[derive(Default)]
pub struct RecordingStatusStore {
    inner: MemoryStatusStore,
    writes: Mutex<Vec<JobSnapshot>>,
    running: Mutex<HashSet<Uuid>>,
    max_running: Mutex<usize>,
}

impl RecordingStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<JobSnapshot> {
        self.writes.lock().unwrap().clone()
    }

    /// Writes for one job, in order
    pub fn writes_for(&self, id: Uuid) -> Vec<JobSnapshot> {
        self.writes().into_iter().filter(|s| s.id == id).collect()
    }

    /// Highest number of jobs observed in `running` at once
    pub fn max_running(&self) -> usize {
        *self.max_running.lock().unwrap()
    }

    /// Job ids in the order they first entered `running`
    pub fn start_order(&self) -> Vec<Uuid> {
        let mut seen = Vec::new();
        for snapshot in self.writes() {
            if snapshot.status == JobStatus::Running && !seen.contains(&snapshot.id) {
                seen.push(snapshot.id);
            }
        }
        seen
    }
}

#[async_trait]
impl StatusStore for RecordingStatusStore {
    async fn write(&self, snapshot: &JobSnapshot) -> Result<(), StatusError> {
        {
            let mut running = self.running.lock().unwrap();
            match snapshot.status {
                JobStatus::Running => {
                    running.insert(snapshot.id);
                },
                JobStatus::Completed | JobStatus::Error => {
                    running.remove(&snapshot.id);
                },
                JobStatus::Queued => {},
            }
            let mut max = self.max_running.lock().unwrap();
            *max = (*max).max(running.len());
            self.writes.lock().unwrap().push(snapshot.clone());
        }

        self.inner.write(snapshot).await
    }

    async fn read(&self, id: Uuid) -> Result<Option<JobSnapshot>, StatusError> {
        self.inner.read(id).await
    }
}

/// Status store whose first write matching `fail_when` fails with an IO error
///
/// Every other write goes through to an in-memory store.
pub struct FailingStatusStore {
    inner: MemoryStatusStore,
    fail_when: Box<dyn Fn(&JobSnapshot) -> bool + Send + Sync>,
    failed: AtomicBool,
}

impl FailingStatusStore {
    pub fn failing_once<F>(fail_when: F) -> Self
    where
        F: Fn(&JobSnapshot) -> bool + Send + Sync + 'static,
    {
        Self {
            inner: MemoryStatusStore::new(),
            fail_when: Box::new(fail_when),
            failed: AtomicBool::new(false),
        }
    }

    /// Fails the write that moves a job to `running`
    pub fn on_start() -> Self {
        Self::failing_once(|s| s.status == JobStatus::Running && s.indexed_count == 0)
    }

    /// Fails the first progress write after a flushed batch
    pub fn on_progress() -> Self {
        Self::failing_once(|s| s.status == JobStatus::Running && s.indexed_count > 0)
    }

    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusStore for FailingStatusStore {
    async fn write(&self, snapshot: &JobSnapshot) -> Result<(), StatusError> {
        if (self.fail_when)(snapshot) && !self.failed.swap(true, Ordering::SeqCst) {
            return Err(StatusError::Io(io::Error::new(io::ErrorKind::Other, "disk full")));
        }
        self.inner.write(snapshot).await
    }

    async fn read(&self, id: Uuid) -> Result<Option<JobSnapshot>, StatusError> {
        self.inner.read(id).await
    }
}

/// Sink whose index preparation is refused by the store
#[derive(Clone, Default)]
pub struct ForbiddenIndexSink {
    inner: MemorySink,
}

impl ForbiddenIndexSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> &MemorySink {
        &self.inner
    }
}

#[async_trait]
impl BulkSink for ForbiddenIndexSink {
    async fn prepare(&self) -> Result<(), SearchError> {
        Err(SearchError::Status {
            status: 403,
            body: "index creation forbidden".to_string(),
        })
    }

    async fn bulk(
        &self,
        records: &[LogRecord],
        refresh: Refresh,
    ) -> Result<BulkSummary, SearchError> {
        self.inner.bulk(records, refresh).await
    }
}
