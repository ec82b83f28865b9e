//! Ingest queries

pub mod get_queue;
pub mod get_status;

pub use get_queue::{GetQueueError, GetQueueQuery};
pub use get_status::{GetIngestStatusError, GetIngestStatusQuery};
