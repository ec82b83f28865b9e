//! Batching bulk writer
//!
//! Records accumulate in memory until a batch is full. A full batch is flushed
//! non-durably when the next record arrives, and [`BatchWriter::finish`] flushes
//! whatever is left durably. For N records and batch size B this issues
//! `ceil(N / B)` requests, every one but the last with `refresh=false`, so the
//! end of a job is always marked by a visible write.

use weblog_common::LogRecord;

use crate::search::{BulkSink, BulkSummary, Refresh, SearchError};

/// Groups records into fixed-size bulk requests against a [`BulkSink`]
pub struct BatchWriter<S> {
    sink: S,
    batch_size: usize,
    buffer: Vec<LogRecord>,
    flushed: u64,
    batches: u64,
    rejected: u64,
}

impl<S: BulkSink> BatchWriter<S> {
    /// A batch size of 0 is treated as 1
    pub fn new(sink: S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            sink,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            flushed: 0,
            batches: 0,
            rejected: 0,
        }
    }

    /// Buffer a record
    ///
    /// Returns the summary of the batch that had to be flushed to make room, if any.
    /// On error the buffered batch is kept and nothing counts as flushed.
    pub async fn push(&mut self, record: LogRecord) -> Result<Option<BulkSummary>, SearchError> {
        let summary = if self.buffer.len() >= self.batch_size {
            Some(self.flush(Refresh::False).await?)
        } else {
            None
        };

        self.buffer.push(record);
        Ok(summary)
    }

    /// Flush the remainder with a durable write
    ///
    /// Returns `None` when nothing was buffered.
    pub async fn finish(&mut self) -> Result<Option<BulkSummary>, SearchError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        self.flush(Refresh::True).await.map(Some)
    }

    /// Records written by successful requests
    pub fn flushed(&self) -> u64 {
        self.flushed
    }

    /// Successful requests so far
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Documents the store refused inside accepted requests
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    async fn flush(&mut self, refresh: Refresh) -> Result<BulkSummary, SearchError> {
        let summary = self.sink.bulk(&self.buffer, refresh).await?;

        self.flushed += self.buffer.len() as u64;
        self.rejected += summary.rejected as u64;
        self.batches += 1;
        self.buffer.clear();

        Ok(summary)
    }
}
