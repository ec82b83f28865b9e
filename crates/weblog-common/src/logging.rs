//! Tracing subscriber bootstrap shared by the weblog binaries
//!
//! A binary builds a [`LogConfig`] with its own defaults, lets `LOG_*` environment
//! variables override them, then calls [`init_logging`] once:
//!
//! ```no_run
//! use tracing::{info, Level};
//! use weblog_common::logging::{init_logging, ConsoleTarget, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::builder()
//!         .level(Level::DEBUG)
//!         .console(ConsoleTarget::Stderr)
//!         .log_file_prefix("weblog-ingest")
//!         .build()
//!         .merge_env()?;
//!
//!     // Dropping the guard flushes file output
//!     let _guard = init_logging(&config)?;
//!
//!     info!(job_id = "0b7c", indexed = 500, "Batch flushed");
//!     Ok(())
//! }
//! ```
//!
//! Pipeline code logs with structured fields (`job_id`, `indexed`, `skipped`, ...)
//! so JSON output can be filtered per job.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Default directory for rotated log files.
pub const DEFAULT_LOG_DIR: &str = "./logs";

/// Default log file prefix; files are named `<prefix>.<yyyy-mm-dd>`.
pub const DEFAULT_LOG_FILE_PREFIX: &str = "weblog";

/// Stream that receives console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    /// Keeps stdout free for program output
    Stderr,
    Off,
}

/// Event encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("Invalid log format: {}", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub console: ConsoleTarget,
    /// Also write daily-rotated files under `log_dir`
    pub file: bool,
    pub log_dir: PathBuf,
    pub log_file_prefix: String,
    pub format: LogFormat,
    /// Extra `EnvFilter` directives, e.g. `sqlx=warn,tower_http=debug`
    pub filter_directives: Option<String>,
    pub include_location: bool,
    pub include_thread_ids: bool,
    pub include_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            console: ConsoleTarget::Stdout,
            file: false,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            log_file_prefix: DEFAULT_LOG_FILE_PREFIX.to_string(),
            format: LogFormat::Text,
            filter_directives: None,
            include_location: false,
            include_thread_ids: false,
            include_targets: true,
        }
    }
}

impl LogConfig {
    /// Defaults overridden by the environment
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Apply `LOG_*` overrides on top of this configuration
    ///
    /// - `LOG_LEVEL`: trace, debug, info, warn, error
    /// - `LOG_OUTPUT`: console, stdout, stderr, file, both
    /// - `LOG_FORMAT`: text, json
    /// - `LOG_DIR`, `LOG_FILE_PREFIX`, `LOG_FILTER`
    /// - `LOG_INCLUDE_LOCATION`, `LOG_INCLUDE_THREAD_IDS`, `LOG_INCLUDE_TARGETS`: true/false
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(level) = env_var("LOG_LEVEL") {
            self.level = level
                .parse()
                .map_err(|_| anyhow!("Invalid log level: {}", level))?;
        }
        if let Some(output) = env_var("LOG_OUTPUT") {
            self.apply_output(&output)?;
        }
        if let Some(format) = env_var("LOG_FORMAT") {
            self.format = format.parse()?;
        }
        if let Some(dir) = env_var("LOG_DIR") {
            self.log_dir = dir.into();
        }
        if let Some(prefix) = env_var("LOG_FILE_PREFIX") {
            self.log_file_prefix = prefix;
        }
        if let Some(filter) = env_var("LOG_FILTER") {
            self.filter_directives = Some(filter);
        }

        self.include_location = env_flag("LOG_INCLUDE_LOCATION").unwrap_or(self.include_location);
        self.include_thread_ids =
            env_flag("LOG_INCLUDE_THREAD_IDS").unwrap_or(self.include_thread_ids);
        self.include_targets = env_flag("LOG_INCLUDE_TARGETS").unwrap_or(self.include_targets);

        Ok(self)
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }

    /// `console` keeps the configured stream, so a binary that logs to stderr
    /// stays on stderr when file output is added.
    fn apply_output(&mut self, output: &str) -> Result<()> {
        let console = match self.console {
            ConsoleTarget::Off => ConsoleTarget::Stdout,
            current => current,
        };

        (self.console, self.file) = match output.to_ascii_lowercase().as_str() {
            "console" => (console, false),
            "stdout" => (ConsoleTarget::Stdout, false),
            "stderr" => (ConsoleTarget::Stderr, false),
            "file" => (ConsoleTarget::Off, true),
            "both" | "all" => (console, true),
            other => bail!("Invalid log output: {}", other),
        };

        Ok(())
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::from_default_env().add_directive(self.level.into());

        let directives = self.filter_directives.as_deref().unwrap_or_default();
        for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            let parsed = directive
                .parse()
                .with_context(|| format!("Failed to parse filter directive '{}'", directive))?;
            filter = filter.add_directive(parsed);
        }

        Ok(filter)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_flag(name: &str) -> Option<bool> {
    env_var(name).and_then(|v| v.parse().ok())
}

/// Builder for LogConfig
#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    pub fn level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    pub fn console(mut self, target: ConsoleTarget) -> Self {
        self.config.console = target;
        self
    }

    pub fn file(mut self, enabled: bool) -> Self {
        self.config.file = enabled;
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    pub fn log_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.log_file_prefix = prefix.into();
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn filter_directives(mut self, filter: impl Into<String>) -> Self {
        self.config.filter_directives = Some(filter.into());
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}

/// Install the global tracing subscriber
///
/// Fails if a subscriber is already installed. With file output enabled the
/// returned guard must be held until exit or buffered lines are lost.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    match config.console {
        ConsoleTarget::Stdout => layers.push(format_layer(config, std::io::stdout, true)),
        ConsoleTarget::Stderr => layers.push(format_layer(config, std::io::stderr, true)),
        ConsoleTarget::Off => {},
    }

    let guard = if config.file {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("Failed to create log directory {}", config.log_dir.display())
        })?;

        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(format_layer(config, writer, false));
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(config.env_filter()?)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

fn format_layer<W>(config: &LogConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(config.include_targets)
        .with_thread_ids(config.include_thread_ids)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_span_events(FmtSpan::CLOSE);

    match config.format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
