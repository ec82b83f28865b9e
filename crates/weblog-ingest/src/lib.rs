//! Weblog Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Runs the ingestion pipeline against a local file without the server's job queue.
//!
//! - **run**: one job in-process, progress recorded in a file-backed status store
//! - **check**: parse-only pass reporting how much of a file matches the log grammar
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use weblog_ingest::{run_file, RunOptions};
//! use weblog_server::search::MemorySink;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = RunOptions::new(500, "./status");
//!     let snapshot = run_file(Arc::new(MemorySink::new()), &options, Path::new("access.log")).await?;
//!     println!("indexed {}", snapshot.indexed_count);
//!     Ok(())
//! }
//! ```

pub mod check;
pub mod run;

pub use check::{check_file, CheckReport};
pub use run::{run_file, RunOptions};
