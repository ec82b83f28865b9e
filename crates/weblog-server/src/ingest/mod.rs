//! Access-log ingestion pipeline
//!
//! parse → batch → write → track → dequeue-next.
//!
//! # Architecture
//!
//! - **jobs**: [`Job`], [`JobSnapshot`] and the `queued → running → completed | error` lifecycle
//! - **writer**: [`BatchWriter`], fixed-size batches with a durable final flush
//! - **status**: [`StatusStore`] implementations (file, sqlite, memory)
//! - **lines**: [`LineReader`], newline splitting with a per-line size cap
//! - **worker**: [`IngestWorker`], runs one job over one file
//! - **queue**: [`JobQueue`], single-concurrency FIFO orchestrator and its [`JobQueueHandle`]
//! - **config**: `INGEST_*` environment configuration
//!
//! # Public API
//!
//! HTTP access goes through `features::ingest`:
//! - `POST /api/v1/ingest/upload` - Upload a log file and queue it
//! - `GET /api/v1/ingest/status/:id` - Job snapshot
//! - `GET /api/v1/ingest/queue` - Running and pending job ids

pub mod config;
pub mod error;
pub mod jobs;
pub mod lines;
pub mod queue;
pub mod status;
pub mod worker;
pub mod writer;

pub use config::{IngestConfig, StatusBackend};
pub use error::{IngestError, QueueError, StatusError};
pub use jobs::{Job, JobSnapshot, JobStatus};
pub use lines::{Line, LineReader, MAX_LINE_BYTES};
pub use queue::{JobQueue, JobQueueHandle, QueueSettings, QueueSnapshot};
pub use status::{FileStatusStore, MemoryStatusStore, SqliteStatusStore, StatusStore};
pub use worker::IngestWorker;
pub use writer::BatchWriter;
