//! Weblog Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, the access-log line parser, logging bootstrap and error handling
//! for the weblog workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`WeblogError`] and the [`Result`] alias
//! - **Parser**: [`parser::LineParser`] turns one combined-format access-log line into a
//!   [`types::LogRecord`], or nothing when the line does not match
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use weblog_common::parser::LineParser;
//!
//! fn main() -> weblog_common::Result<()> {
//!     let parser = LineParser::new()?;
//!     let line = r#"1.2.3.4 - - [22/Jan/2019:03:56:14 +0330] "GET /a HTTP/1.1" 200 512 "-" "curl""#;
//!     if let Some(record) = parser.parse_line(line) {
//!         assert_eq!(record.status, 200);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use error::{Result, WeblogError};
pub use types::LogRecord;
