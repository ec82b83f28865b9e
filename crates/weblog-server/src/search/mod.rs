//! External search-store boundary
//!
//! The ingestion pipeline only needs one thing from the search engine: a bulk
//! write with a durability flag. That seam is the [`BulkSink`] trait.
//!
//! - **sink**: [`BulkSink`], [`Refresh`], [`BulkSummary`] and the in-memory [`MemorySink`]
//! - **client**: [`ElasticClient`], the HTTP implementation plus index administration
//! - **mapping**: index mapping for access-log documents
//! - **config**: connection settings (`ELASTIC_*` environment variables)

pub mod client;
pub mod config;
pub mod error;
pub mod mapping;
pub mod sink;

pub use client::{ClusterHealth, ElasticClient};
pub use config::{ElasticAuth, ElasticConfig};
pub use error::SearchError;
pub use sink::{BulkCall, BulkSink, BulkSummary, MemorySink, Refresh};
