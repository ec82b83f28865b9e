//! Search-store connection configuration

use serde::{Deserialize, Serialize};

use crate::config::env_or;

/// Default search store URL for local development.
pub const DEFAULT_ELASTIC_URL: &str = "http://localhost:9200";

/// Default index that receives access-log documents.
pub const DEFAULT_ELASTIC_INDEX: &str = "web-logs";

/// Default request timeout in seconds. Bulk requests of a full batch can be slow.
pub const DEFAULT_ELASTIC_TIMEOUT_SECS: u64 = 60;

/// Credentials sent with every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElasticAuth {
    #[default]
    None,
    Basic { username: String, password: String },
    ApiKey { key: String },
}

/// Search store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticConfig {
    pub url: String,
    pub index: String,
    pub auth: ElasticAuth,
    /// Accept self-signed certificates (local clusters only)
    pub accept_invalid_certs: bool,
    pub timeout_secs: u64,
}

impl ElasticConfig {
    /// Load from `ELASTIC_*` environment variables
    ///
    /// `ELASTIC_API_KEY` wins over `ELASTIC_USER`/`ELASTIC_PASS` when both are set.
    pub fn from_env() -> anyhow::Result<Self> {
        let auth = match (
            std::env::var("ELASTIC_API_KEY").ok(),
            std::env::var("ELASTIC_USER").ok(),
            std::env::var("ELASTIC_PASS").ok(),
        ) {
            (Some(key), _, _) if !key.is_empty() => ElasticAuth::ApiKey { key },
            (_, Some(username), Some(password)) => ElasticAuth::Basic { username, password },
            _ => ElasticAuth::None,
        };

        Ok(Self {
            url: std::env::var("ELASTIC_URL").unwrap_or_else(|_| DEFAULT_ELASTIC_URL.to_string()),
            index: std::env::var("ELASTIC_INDEX")
                .unwrap_or_else(|_| DEFAULT_ELASTIC_INDEX.to_string()),
            auth,
            accept_invalid_certs: env_or("ELASTIC_ACCEPT_INVALID_CERTS", false)?,
            timeout_secs: env_or("ELASTIC_TIMEOUT_SECS", DEFAULT_ELASTIC_TIMEOUT_SECS)?,
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ELASTIC_URL.to_string(),
            index: DEFAULT_ELASTIC_INDEX.to_string(),
            auth: ElasticAuth::None,
            accept_invalid_certs: false,
            timeout_secs: DEFAULT_ELASTIC_TIMEOUT_SECS,
        }
    }
}
