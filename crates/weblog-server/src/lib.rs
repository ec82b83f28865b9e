//! Weblog Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Ingests web-server access logs into a search index and tracks each ingestion job.
//!
//! # Overview
//!
//! - **Ingestion pipeline** ([`ingest`]): line parsing, batched bulk writes, job status
//!   tracking and a single-concurrency FIFO job queue
//! - **Search store** ([`search`]): bulk-write seam and the Elasticsearch HTTP client
//! - **HTTP API** ([`api`], [`features`]): upload, status polling, queue inspection,
//!   index reset and health
//! - **Configuration**: environment-based configuration management
//!
//! # Architecture
//!
//! ```text
//! upload ─▶ JobQueueHandle::submit ─▶ JobQueue (event loop, one job at a time)
//!                                        │
//!                                        ▼ spawned task per job
//!                                   IngestWorker ─▶ LineParser ─▶ BatchWriter ─▶ BulkSink
//!                                        │
//!                                        ▼
//!                                   StatusStore ◀── GET /api/v1/ingest/status/:id
//! ```
//!
//! Feature routes follow a **CQRS** layout: commands (upload, reset) and queries
//! (status, queue) are separate request types handled by plain async functions.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use weblog_server::ingest::{IngestWorker, JobQueue, MemoryStatusStore, QueueSettings};
//! use weblog_server::search::MemorySink;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let worker = IngestWorker::new(
//!         Arc::new(MemorySink::new()),
//!         Arc::new(MemoryStatusStore::new()),
//!         500,
//!     )?;
//!     let (queue, _task) = JobQueue::spawn(worker, QueueSettings::default());
//!
//!     let job_id = queue.submit("access.log").await?;
//!     println!("{:?}", queue.status(job_id).await?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod search;

// Re-export commonly used types
pub use error::AppError;
