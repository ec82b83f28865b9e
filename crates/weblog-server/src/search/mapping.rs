//! Index mapping for access-log documents

use serde_json::{json, Value};

/// Date layout of `LogRecord::timestamp` in the search store's format syntax
pub const TIMESTAMP_FORMAT: &str = "dd/MMM/yyyy:HH:mm:ss Z";

/// Index creation body: exact-match ip/method/protocol, full-text url/referrer/agent
pub fn index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "ip": { "type": "keyword" },
                "timestamp": { "type": "date", "format": TIMESTAMP_FORMAT },
                "method": { "type": "keyword" },
                "url": { "type": "text" },
                "protocol": { "type": "keyword" },
                "status": { "type": "integer" },
                "bytes": { "type": "integer" },
                "referrer": { "type": "text" },
                "agent": { "type": "text" }
            }
        }
    })
}
