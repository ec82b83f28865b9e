//! Single in-process ingestion run

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use weblog_server::ingest::{
    FileStatusStore, IngestError, IngestWorker, Job, JobSnapshot, StatusStore,
};
use weblog_server::search::BulkSink;

/// Settings for a local run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub batch_size: usize,
    /// Where the job's status record is written
    pub status_dir: PathBuf,
}

impl RunOptions {
    pub fn new(batch_size: usize, status_dir: impl Into<PathBuf>) -> Self {
        Self {
            batch_size,
            status_dir: status_dir.into(),
        }
    }
}

/// Ingest `path` into `sink` as one job and return its final snapshot
///
/// A job that fails still returns `Ok` with its `error` snapshot; `Err` means the
/// failure could not be recorded at all.
pub async fn run_file(
    sink: Arc<dyn BulkSink>,
    options: &RunOptions,
    path: &Path,
) -> Result<JobSnapshot, IngestError> {
    let status = Arc::new(FileStatusStore::open(&options.status_dir).await?);
    let worker = IngestWorker::new(sink, status.clone(), options.batch_size)?;

    let job = Job::new(path);
    let id = job.id;
    info!(job_id = %id, file = %path.display(), "Running ingestion job");

    match worker.run(job).await {
        Ok(snapshot) => Ok(snapshot),
        Err(e) => match status.read(id).await? {
            Some(snapshot) if snapshot.is_terminal() => Ok(snapshot),
            _ => Err(e),
        },
    }
}
