//! Common types used across weblog

use serde::{Deserialize, Serialize};

/// One parsed access-log entry.
///
/// A record only exists when all nine fields were recovered from a line; there is
/// no partially-populated form. `timestamp` keeps the source layout
/// (`dd/MMM/yyyy:HH:mm:ss Z`) because the search index maps it with that format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogRecord {
    pub ip: String,
    pub timestamp: String,
    pub method: String,
    pub url: String,
    pub protocol: String,
    /// HTTP status code
    pub status: u16,
    /// Response size in bytes
    pub bytes: u64,
    pub referrer: String,
    pub agent: String,
}

impl LogRecord {
    /// Whether the user agent looks like a crawler.
    pub fn is_bot(&self) -> bool {
        self.agent.to_ascii_lowercase().contains("bot")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(agent: &str) -> LogRecord {
        LogRecord {
            ip: "10.0.0.1".to_string(),
            timestamp: "22/Jan/2019:03:56:14 +0330".to_string(),
            method: "GET".to_string(),
            url: "/".to_string(),
            protocol: "HTTP/1.1".to_string(),
            status: 200,
            bytes: 10,
            referrer: "-".to_string(),
            agent: agent.to_string(),
        }
    }

    #[test]
    fn test_is_bot() {
        assert!(record("Mozilla/5.0 (compatible; Googlebot/2.1)").is_bot());
        assert!(record("AhrefsBot").is_bot());
        assert!(!record("Mozilla/5.0 (Windows NT 10.0)").is_bot());
    }

    #[test]
    fn test_serializes_field_names() {
        let value = serde_json::to_value(record("curl")).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["bytes"], 10);
        assert_eq!(value["referrer"], "-");
    }
}
