//! Logs feature module
//!
//! Administration of the access-log index.

pub mod commands;
pub mod routes;

pub use routes::logs_routes;
