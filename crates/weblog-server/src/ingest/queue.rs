//! Single-concurrency FIFO job queue
//!
//! [`JobQueue`] is an event loop that owns the pending jobs and the one running
//! worker task. It reacts to two events, a command from a [`JobQueueHandle`] and
//! the exit of the running worker, so dispatch decisions never race.
//!
//! Each job runs in its own spawned task. A panic, an abort or a timeout in that
//! task surfaces as a structured exit that the loop observes; the loop then makes
//! sure the job's status is terminal and dispatches the next job.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::config::IngestConfig;
use super::error::{IngestError, QueueError};
use super::jobs::{Job, JobSnapshot};
use super::status::StatusStore;
use super::worker::IngestWorker;

type WorkerResult = Result<JobSnapshot, IngestError>;

/// Queue tuning
#[derive(Debug, Clone, Copy)]
pub struct QueueSettings {
    /// Command channel capacity
    pub capacity: usize,
    /// Per-job time limit
    pub job_timeout: Option<Duration>,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            capacity: super::config::DEFAULT_QUEUE_CAPACITY,
            job_timeout: None,
        }
    }
}

impl From<&IngestConfig> for QueueSettings {
    fn from(config: &IngestConfig) -> Self {
        Self {
            capacity: config.queue_capacity.max(1),
            job_timeout: config.job_timeout(),
        }
    }
}

/// Point-in-time view of the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub running: Option<Uuid>,
    /// Dispatch order
    pub pending: Vec<Uuid>,
}

enum Command {
    Submit(Job),
    Snapshot(oneshot::Sender<QueueSnapshot>),
}

struct RunningJob {
    job: Job,
    handle: JoinHandle<WorkerResult>,
}

/// Cloneable handle for submitting jobs and reading their status
///
/// The queue stops once every handle has been dropped.
#[derive(Clone)]
pub struct JobQueueHandle {
    cmd_tx: mpsc::Sender<Command>,
    status: Arc<dyn StatusStore>,
}

impl JobQueueHandle {
    /// Queue `source_file` for ingestion and return its job id
    ///
    /// The `queued` snapshot is written before the job is handed to the queue, so
    /// the id is immediately pollable. Does not wait for any running job.
    pub async fn submit(&self, source_file: impl Into<PathBuf>) -> Result<Uuid, QueueError> {
        let job = Job::new(source_file);
        let id = job.id;

        let mut snapshot = JobSnapshot::queued(&job);
        self.status.write(&snapshot).await?;

        if self.cmd_tx.send(Command::Submit(job)).await.is_err() {
            snapshot.fail(QueueError::Shutdown.to_string());
            if let Err(e) = self.status.write(&snapshot).await {
                warn!(job_id = %id, error = %e, "Failed to record rejected job");
            }
            return Err(QueueError::Shutdown);
        }

        info!(job_id = %id, file = %snapshot.source_file, "Job submitted");
        Ok(id)
    }

    /// Last recorded snapshot of a job, `None` for an unknown id
    pub async fn status(&self, id: Uuid) -> Result<Option<JobSnapshot>, QueueError> {
        Ok(self.status.read(id).await?)
    }

    /// Running and pending job ids
    pub async fn snapshot(&self) -> Result<QueueSnapshot, QueueError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Snapshot(tx))
            .await
            .map_err(|_| QueueError::Shutdown)?;
        rx.await.map_err(|_| QueueError::Shutdown)
    }
}

/// The queue's event loop state
pub struct JobQueue {
    cmd_rx: mpsc::Receiver<Command>,
    pending: VecDeque<Job>,
    running: Option<RunningJob>,
    worker: IngestWorker,
    status: Arc<dyn StatusStore>,
    job_timeout: Option<Duration>,
}

impl JobQueue {
    /// Start the event loop on the current runtime
    ///
    /// Returns the handle to submit through and the loop's task, which completes
    /// after all handles are dropped and the running job (if any) has exited.
    pub fn spawn(worker: IngestWorker, settings: QueueSettings) -> (JobQueueHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(settings.capacity.max(1));
        let status = worker.status_store().clone();

        let queue = Self {
            cmd_rx,
            pending: VecDeque::new(),
            running: None,
            worker,
            status: status.clone(),
            job_timeout: settings.job_timeout,
        };

        let handle = JobQueueHandle { cmd_tx, status };
        (handle, tokio::spawn(queue.run()))
    }

    async fn run(mut self) {
        info!("Job queue started");
        let mut accepting = true;

        loop {
            if !accepting && self.running.is_none() {
                break;
            }

            tokio::select! {
                cmd = self.cmd_rx.recv(), if accepting => match cmd {
                    Some(Command::Submit(job)) => {
                        self.pending.push_back(job);
                        self.dispatch();
                    },
                    Some(Command::Snapshot(reply)) => {
                        let _ = reply.send(self.snapshot());
                    },
                    None => {
                        accepting = false;
                        info!(
                            pending = self.pending.len(),
                            "All queue handles dropped, no further jobs will be dispatched"
                        );
                    },
                },
                (job, result) = wait_running(&mut self.running) => {
                    self.running = None;
                    self.on_exit(job, result).await;
                    if accepting {
                        self.dispatch();
                    }
                },
            }
        }

        info!("Job queue stopped");
    }

    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            running: self.running.as_ref().map(|r| r.job.id),
            pending: self.pending.iter().map(|job| job.id).collect(),
        }
    }

    /// Start the head of the queue if nothing is running
    fn dispatch(&mut self) {
        if self.running.is_some() {
            return;
        }
        let Some(job) = self.pending.pop_front() else {
            return;
        };

        info!(job_id = %job.id, remaining = self.pending.len(), "Dispatching job");

        let worker = self.worker.clone();
        let timeout = self.job_timeout;
        let task_job = job.clone();

        let handle = tokio::spawn(async move {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, worker.run(task_job))
                    .await
                    .unwrap_or(Err(IngestError::Timeout(limit))),
                None => worker.run(task_job).await,
            }
        });

        self.running = Some(RunningJob { job, handle });
    }

    async fn on_exit(&self, job: Job, result: Result<WorkerResult, JoinError>) {
        match result {
            Ok(Ok(snapshot)) => {
                info!(
                    job_id = %job.id,
                    indexed = snapshot.indexed_count,
                    skipped = snapshot.skipped_count,
                    "Job finished"
                );
            },
            Ok(Err(e)) => {
                error!(job_id = %job.id, error = %e, "Job ended with error");
                self.ensure_terminal(&job, &e).await;
            },
            Err(join_err) => {
                let e = IngestError::WorkerCrashed(crash_reason(join_err));
                error!(job_id = %job.id, error = %e, "Worker crashed");
                self.ensure_terminal(&job, &e).await;
            },
        }
    }

    /// Record `cause` unless the job already reached a terminal status
    async fn ensure_terminal(&self, job: &Job, cause: &IngestError) {
        let current = match self.status.read(job.id).await {
            Ok(current) => current,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Failed to read job status");
                None
            },
        };

        let mut snapshot = match current {
            Some(snapshot) if snapshot.is_terminal() => return,
            Some(snapshot) => snapshot,
            None => JobSnapshot::queued(job),
        };

        snapshot.fail(cause.to_string());
        if let Err(e) = self.status.write(&snapshot).await {
            error!(job_id = %job.id, error = %e, "Failed to record job failure");
        }
    }
}

/// Wait for the running job's task, or forever when nothing runs
async fn wait_running(running: &mut Option<RunningJob>) -> (Job, Result<WorkerResult, JoinError>) {
    match running {
        Some(running) => {
            let result = (&mut running.handle).await;
            (running.job.clone(), result)
        },
        None => std::future::pending().await,
    }
}

fn crash_reason(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task was cancelled".to_string();
    }

    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with non-string payload".to_string()),
        Err(err) => err.to_string(),
    }
}
