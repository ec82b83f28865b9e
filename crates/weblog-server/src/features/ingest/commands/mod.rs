//! Ingest commands

pub mod submit;

pub use submit::{SubmitIngestCommand, SubmitIngestError, SubmitIngestResponse};
