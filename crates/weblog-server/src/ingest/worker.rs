//! Ingestion worker
//!
//! Runs one job end to end: reads the source file line by line, parses each line,
//! feeds matches to a [`BatchWriter`] and records progress in the status store
//! after every flushed batch.

use std::sync::Arc;
use tokio::fs::File;
use tokio::io::BufReader;
use tracing::{debug, info, instrument, warn};
use weblog_common::parser::LineParser;

use super::error::IngestError;
use super::jobs::{Job, JobSnapshot};
use super::lines::{Line, LineReader, MAX_LINE_BYTES};
use super::status::StatusStore;
use super::writer::BatchWriter;
use crate::search::BulkSink;

/// Executes ingestion jobs against a sink and a status store
#[derive(Clone)]
pub struct IngestWorker {
    sink: Arc<dyn BulkSink>,
    status: Arc<dyn StatusStore>,
    parser: LineParser,
    batch_size: usize,
}

impl IngestWorker {
    pub fn new(
        sink: Arc<dyn BulkSink>,
        status: Arc<dyn StatusStore>,
        batch_size: usize,
    ) -> Result<Self, IngestError> {
        Ok(Self {
            sink,
            status,
            parser: LineParser::new()?,
            batch_size,
        })
    }

    pub fn status_store(&self) -> &Arc<dyn StatusStore> {
        &self.status
    }

    /// Run `job` to a terminal state
    ///
    /// The final snapshot is written before returning. On failure, including a
    /// failed status write, the error is returned after an `error` snapshot was
    /// attempted.
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    pub async fn run(&self, job: Job) -> Result<JobSnapshot, IngestError> {
        let mut snapshot = JobSnapshot::queued(&job);
        snapshot.start();

        let outcome = match self.ingest(&job, &mut snapshot).await {
            Ok(()) => {
                snapshot.complete();
                self.status.write(&snapshot).await.map_err(IngestError::from)
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                info!(
                    indexed = snapshot.indexed_count,
                    skipped = snapshot.skipped_count,
                    "Job completed"
                );
                Ok(snapshot)
            },
            Err(e) => {
                snapshot.fail(e.to_string());
                if let Err(status_err) = self.status.write(&snapshot).await {
                    warn!(error = %status_err, "Failed to record job failure");
                }

                warn!(
                    indexed = snapshot.indexed_count,
                    skipped = snapshot.skipped_count,
                    error = %e,
                    "Job failed"
                );
                Err(e)
            },
        }
    }

    async fn ingest(&self, job: &Job, snapshot: &mut JobSnapshot) -> Result<(), IngestError> {
        let io_error = |source: std::io::Error| IngestError::Io {
            path: job.source_file.clone(),
            source,
        };

        self.status.write(snapshot).await?;
        info!(file = %snapshot.source_file, "Job started");

        self.sink.prepare().await.map_err(IngestError::IndexSetup)?;

        let file = File::open(&job.source_file).await.map_err(io_error)?;
        let mut lines = LineReader::new(BufReader::new(file));
        let mut writer = BatchWriter::new(self.sink.clone(), self.batch_size);

        while let Some(line) = lines.next_line().await.map_err(io_error)? {
            let record = match line {
                Line::Text(text) => self.parser.parse_line(&text),
                Line::Oversized => {
                    debug!(max_bytes = MAX_LINE_BYTES, "Skipping oversized line");
                    None
                },
            };

            let Some(record) = record else {
                snapshot.skipped_count += 1;
                continue;
            };

            if let Some(summary) = writer.push(record).await? {
                snapshot.indexed_count = writer.flushed();
                self.status.write(snapshot).await?;

                debug!(
                    batch = writer.batches(),
                    records = summary.items,
                    indexed = snapshot.indexed_count,
                    "Batch flushed"
                );
            }
        }

        if let Some(summary) = writer.finish().await? {
            snapshot.indexed_count = writer.flushed();

            debug!(
                batch = writer.batches(),
                records = summary.items,
                indexed = snapshot.indexed_count,
                "Final batch flushed"
            );
        }

        if writer.rejected() > 0 {
            warn!(rejected = writer.rejected(), "Search store rejected some documents");
        }

        Ok(())
    }
}
