//! Configuration management

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ingest::IngestConfig;
use crate::search::ElasticConfig;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default CORS allowed origin (any).
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub elastic: ElasticConfig,
    pub ingest: IngestConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on waiting for the running ingestion job at shutdown
    pub shutdown_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// A `.env` file in the working directory is read first; real environment
    /// variables win over it.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let server = ServerConfig {
            host: env_or("WEBLOG_HOST", DEFAULT_SERVER_HOST.to_string())?,
            port: env_or("WEBLOG_PORT", DEFAULT_SERVER_PORT)?,
            shutdown_timeout_secs: env_or("WEBLOG_SHUTDOWN_TIMEOUT", DEFAULT_SHUTDOWN_TIMEOUT_SECS)?,
        };

        let origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string());
        let cors = CorsConfig {
            allowed_origins: parse_origins(&origins),
            allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", false)?,
        };

        let config = Config {
            server,
            cors,
            elastic: ElasticConfig::from_env()?,
            ingest: IngestConfig::from_env()?,
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("WEBLOG_PORT must be greater than 0");
        }

        if self.elastic.url.is_empty() {
            anyhow::bail!("Search store URL cannot be empty");
        }

        if self.elastic.index.trim().is_empty() {
            anyhow::bail!("Search index name cannot be empty");
        }

        if self.ingest.batch_size == 0 {
            anyhow::bail!("Ingest batch size must be greater than 0");
        }

        if self.ingest.queue_capacity == 0 {
            anyhow::bail!("Ingest queue capacity must be greater than 0");
        }

        // Browsers reject a wildcard origin combined with credentials
        if self.cors.allow_credentials && self.cors.allowed_origins.iter().any(|o| o == "*") {
            anyhow::bail!("CORS_ALLOW_CREDENTIALS cannot be used with a wildcard origin");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty, allowing any origin");
        }

        Ok(())
    }
}

/// Parsed value of `key`; `None` when unset or blank
///
/// A value that is set but does not parse is a configuration error.
pub(crate) fn env_parse<T: FromStr>(key: &str) -> anyhow::Result<Option<T>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("Invalid value for {}: {:?}", key, value)),
        _ => Ok(None),
    }
}

/// Parsed value of `key`, or `default` when unset
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    Ok(env_parse(key)?.unwrap_or(default))
}

/// Comma-separated origin list; blank entries are skipped
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
            allow_credentials: false,
        }
    }
}
