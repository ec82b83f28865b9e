//! Parse-only pass over a log file

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs::File;
use tokio::io::BufReader;
use weblog_common::parser::LineParser;
use weblog_common::Result;
use weblog_server::ingest::{Line, LineReader};

/// Line counts for one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub total_lines: u64,
    pub matched: u64,
    /// Lines that would be skipped during ingestion
    pub skipped: u64,
    /// Matched requests whose agent looks like a crawler
    pub bot_requests: u64,
}

impl CheckReport {
    /// Fraction of lines that matched, 0.0 for an empty file
    pub fn match_ratio(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            self.matched as f64 / self.total_lines as f64
        }
    }
}

/// Parse every line of `path` without writing anywhere
///
/// Lines are split and decoded exactly as an ingestion job does, so `skipped` is
/// what a job over the same file would report.
pub async fn check_file(path: &Path) -> Result<CheckReport> {
    let parser = LineParser::new()?;
    let mut lines = LineReader::new(BufReader::new(File::open(path).await?));
    let mut report = CheckReport::default();

    while let Some(line) = lines.next_line().await? {
        report.total_lines += 1;

        let record = match line {
            Line::Text(text) => parser.parse_line(&text),
            Line::Oversized => None,
        };

        match record {
            Some(record) => {
                report.matched += 1;
                if record.is_bot() {
                    report.bot_requests += 1;
                }
            },
            None => report.skipped += 1,
        }
    }

    Ok(report)
}
