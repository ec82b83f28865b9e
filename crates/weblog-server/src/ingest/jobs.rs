//! Job definitions and status snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Lifecycle state of an ingestion job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Completed and error are final
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "error" => Ok(JobStatus::Error),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// One ingestion request: a file and the id it is tracked under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub source_file: PathBuf,
}

impl Job {
    /// New job with a fresh id
    pub fn new(source_file: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_file: source_file.into(),
        }
    }
}

/// Persisted progress of a job
///
/// `finished_at` is only set once the job is completed or errored, and
/// `error_message` only when it errored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub status: JobStatus,
    pub source_file: String,
    /// Records in successfully written batches
    pub indexed_count: u64,
    /// Lines that did not parse
    pub skipped_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobSnapshot {
    /// Snapshot of a job that has been accepted but not dispatched
    pub fn queued(job: &Job) -> Self {
        Self {
            id: job.id,
            status: JobStatus::Queued,
            source_file: job.source_file.display().to_string(),
            indexed_count: 0,
            skipped_count: 0,
            started_at: None,
            finished_at: None,
            error_message: None,
        }
    }

    /// Transition to running with zeroed counters
    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.indexed_count = 0;
        self.skipped_count = 0;
        self.started_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.error_message = None;
    }

    /// Mark as errored, keeping whatever was indexed so far
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Error;
        self.finished_at = Some(Utc::now());
        self.error_message = Some(message.into());
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
