//! Logs commands

pub mod reset_index;

pub use reset_index::{ResetIndexCommand, ResetIndexError, ResetIndexResponse};
