//! Combined access-log line parser
//!
//! Matches the NCSA/Apache combined format:
//!
//! ```text
//! IP - - [TIMESTAMP] "METHOD URL PROTOCOL" STATUS BYTES "REFERRER" "AGENT"
//! ```
//!
//! Parsing is line-local: a line either yields a full [`LogRecord`] or nothing.
//! Lines that do not match are dropped by the caller; they are never an error.
//! Anything after the closing quote of the agent field is ignored.

use regex::Regex;
use std::borrow::Cow;

use crate::error::{Result, WeblogError};
use crate::types::LogRecord;

/// Combined log grammar. Digit classes are ASCII-only so status/bytes always
/// coerce to integers when they match.
pub const COMBINED_LOG_PATTERN: &str =
    r#"^(\S+) - - \[(.*?)\] "(\S+) (\S+) (\S+)" ([0-9]{3}) ([0-9]+) "(.*?)" "(.*?)""#;

/// Parser for combined-format access-log lines
#[derive(Debug, Clone)]
pub struct LineParser {
    pattern: Regex,
}

impl LineParser {
    /// Compile the combined log grammar
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(COMBINED_LOG_PATTERN)
            .map_err(|e| WeblogError::Parse(format!("invalid log pattern: {}", e)))?;

        Ok(Self { pattern })
    }

    /// Parse a single line (without its line terminator)
    ///
    /// Returns `None` when the line does not match the grammar, including the case
    /// where `bytes` overflows a `u64`.
    pub fn parse_line(&self, line: &str) -> Option<LogRecord> {
        let caps = self.pattern.captures(line)?;
        let field = |i: usize| caps.get(i).map(|m| m.as_str());

        Some(LogRecord {
            ip: field(1)?.to_string(),
            timestamp: field(2)?.to_string(),
            method: field(3)?.to_string(),
            url: field(4)?.to_string(),
            protocol: field(5)?.to_string(),
            status: field(6)?.parse().ok()?,
            bytes: field(7)?.parse().ok()?,
            referrer: field(8)?.to_string(),
            agent: field(9)?.to_string(),
        })
    }
}

/// Line bytes to text: drop the terminator and a trailing `\r`, decode lossily
///
/// Invalid UTF-8 is replaced rather than rejected, so such a line simply fails to
/// match the grammar.
pub fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: &str = r#"54.36.149.41 - - [22/Jan/2019:03:56:14 +0330] "GET /filter/27|13%20%D9%85%DA%AF%D8%A7%D9%BE%DB%8C%DA%A9%D8%B3%D9%84,27|%DA%A9%D9%85%D8%AA%D8%B1%20%D8%A7%D8%B2%205%20%D9%85%DA%AF%D8%A7%D9%BE%DB%8C%DA%A9%D8%B3%D9%84,p53 HTTP/1.1" 200 30577 "-" "Mozilla/5.0 (compatible; AhrefsBot/6.1; +http://ahrefs.com/robot/)" "-""#;

    fn parser() -> LineParser {
        LineParser::new().unwrap()
    }

    #[test]
    fn test_parse_combined_line() {
        let record = parser().parse_line(SAMPLE).unwrap();

        assert_eq!(record.ip, "54.36.149.41");
        assert_eq!(record.timestamp, "22/Jan/2019:03:56:14 +0330");
        assert_eq!(record.method, "GET");
        assert!(record.url.starts_with("/filter/27|13"));
        assert_eq!(record.protocol, "HTTP/1.1");
        assert_eq!(record.status, 200);
        assert_eq!(record.bytes, 30577);
        assert_eq!(record.referrer, "-");
        assert_eq!(
            record.agent,
            "Mozilla/5.0 (compatible; AhrefsBot/6.1; +http://ahrefs.com/robot/)"
        );
    }

    #[test]
    fn test_parse_referrer_with_url() {
        let line = r#"5.211.97.39 - - [22/Jan/2019:03:56:57 +0330] "GET /image/33888?name=main.jpg&wh=200x200 HTTP/1.1" 304 0 "https://www.example.com/m/browse/cell-phone" "Mozilla/5.0 (iPhone)""#;
        let record = parser().parse_line(line).unwrap();

        assert_eq!(record.status, 304);
        assert_eq!(record.bytes, 0);
        assert_eq!(record.referrer, "https://www.example.com/m/browse/cell-phone");
        assert_eq!(record.agent, "Mozilla/5.0 (iPhone)");
    }

    #[test]
    fn test_rejects_malformed_lines() {
        let p = parser();

        assert!(p.parse_line("").is_none());
        assert!(p.parse_line("not a log line").is_none());
        // Dash for bytes is not part of the grammar
        assert!(p
            .parse_line(r#"1.1.1.1 - - [22/Jan/2019:03:56:14 +0330] "GET / HTTP/1.1" 404 - "-" "curl""#)
            .is_none());
        // Request line without protocol
        assert!(p
            .parse_line(r#"1.1.1.1 - - [22/Jan/2019:03:56:14 +0330] "GET /" 200 5 "-" "curl""#)
            .is_none());
        // Identity/user fields must be dashes
        assert!(p
            .parse_line(r#"1.1.1.1 ident bob [22/Jan/2019:03:56:14 +0330] "GET / HTTP/1.1" 200 5 "-" "curl""#)
            .is_none());
        // Missing agent
        assert!(p
            .parse_line(r#"1.1.1.1 - - [22/Jan/2019:03:56:14 +0330] "GET / HTTP/1.1" 200 5 "-""#)
            .is_none());
    }

    #[test]
    fn test_rejects_non_ascii_digits() {
        let line = r#"1.1.1.1 - - [22/Jan/2019:03:56:14 +0330] "GET / HTTP/1.1" ٢٠٠ 5 "-" "curl""#;
        assert!(parser().parse_line(line).is_none());
    }

    #[test]
    fn test_rejects_bytes_overflow() {
        let line = r#"1.1.1.1 - - [22/Jan/2019:03:56:14 +0330] "GET / HTTP/1.1" 200 99999999999999999999999 "-" "curl""#;
        assert!(parser().parse_line(line).is_none());
    }

    #[test]
    fn test_parse_is_independent_of_previous_lines() {
        let p = parser();
        let first = p.parse_line(SAMPLE);
        assert!(p.parse_line("garbage").is_none());
        assert_eq!(p.parse_line(SAMPLE), first);
    }

    #[test]
    fn test_decode_line_strips_terminators() {
        assert_eq!(decode_line(b"abc\r\n"), "abc");
        assert_eq!(decode_line(b"abc\n"), "abc");
        assert_eq!(decode_line(b"abc"), "abc");
        assert_eq!(decode_line(b"\n"), "");
    }

    #[test]
    fn test_decode_line_is_lossy() {
        let decoded = decode_line(b"caf\xff\n");
        assert!(decoded.starts_with("caf"));
        assert!(decoded.contains('\u{FFFD}'));
    }

    proptest! {
        #[test]
        fn prop_matching_lines_yield_all_fields(
            ip in "[0-9a-f.:]{1,39}",
            timestamp in "[0-9A-Za-z/:+ ]{1,30}",
            method in "[A-Z]{1,7}",
            url in "/[A-Za-z0-9/._?=&%-]{0,40}",
            protocol in "HTTP/[0-9]\\.[0-9]",
            status in 100u16..1000,
            bytes in any::<u64>(),
            referrer in "[^\"\n]{0,40}",
            agent in "[^\"\n]{0,40}",
        ) {
            let line = format!(
                r#"{} - - [{}] "{} {} {}" {} {} "{}" "{}""#,
                ip, timestamp, method, url, protocol, status, bytes, referrer, agent
            );
            let record = parser().parse_line(&line).expect("line should match");

            prop_assert_eq!(record.ip, ip);
            prop_assert_eq!(record.timestamp, timestamp);
            prop_assert_eq!(record.method, method);
            prop_assert_eq!(record.url, url);
            prop_assert_eq!(record.protocol, protocol);
            prop_assert_eq!(record.status, status);
            prop_assert_eq!(record.bytes, bytes);
            prop_assert_eq!(record.referrer, referrer);
            prop_assert_eq!(record.agent, agent);
        }

        #[test]
        fn prop_lines_without_separator_never_match(line in "[^-]{0,120}") {
            prop_assert!(parser().parse_line(&line).is_none());
        }
    }
}
