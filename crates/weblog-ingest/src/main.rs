//! Weblog Ingest - index a local access-log file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use weblog_common::logging::{init_logging, ConsoleTarget, LogConfig};
use weblog_ingest::{check_file, run_file, RunOptions};
use weblog_server::ingest::{IngestConfig, JobStatus};
use weblog_server::search::{BulkSink, ElasticClient, ElasticConfig, MemorySink};

#[derive(Parser, Debug)]
#[command(name = "weblog-ingest")]
#[command(author, version, about = "Web access-log ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a log file into the configured index
    Run {
        /// Access-log file
        file: PathBuf,

        /// Records per bulk request (default: INGEST_BATCH_SIZE or 500)
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Directory for the job status record (default: INGEST_STATUS_DIR)
        #[arg(long)]
        status_dir: Option<PathBuf>,

        /// Parse and batch without contacting the search store
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse a log file and report how many lines match
    Check {
        /// Access-log file
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // stdout carries the report
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("weblog-ingest")
        .console(ConsoleTarget::Stderr)
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    match cli.command {
        Command::Run {
            file,
            batch_size,
            status_dir,
            dry_run,
        } => run(file, batch_size, status_dir, dry_run).await,
        Command::Check { file, json } => check(file, json).await,
    }
}

async fn run(
    file: PathBuf,
    batch_size: Option<usize>,
    status_dir: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let config = IngestConfig::from_env()?;
    let batch_size = batch_size.unwrap_or(config.batch_size);
    if batch_size == 0 {
        bail!("Batch size must be greater than 0");
    }

    let options = RunOptions::new(batch_size, status_dir.unwrap_or(config.status_dir));

    let sink: Arc<dyn BulkSink> = if dry_run {
        info!("Dry run, records are not sent to the search store");
        Arc::new(MemorySink::new())
    } else {
        let elastic = ElasticConfig::from_env()?;
        info!(url = %elastic.url, index = %elastic.index, "Writing to search store");
        Arc::new(ElasticClient::new(elastic).context("Failed to build search store client")?)
    };

    let snapshot = run_file(sink, &options, &file)
        .await
        .with_context(|| format!("Failed to ingest {}", file.display()))?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    if snapshot.status == JobStatus::Error {
        bail!(
            "Ingestion failed: {}",
            snapshot.error_message.as_deref().unwrap_or("unknown error")
        );
    }

    info!(indexed = snapshot.indexed_count, skipped = snapshot.skipped_count, "Ingestion complete");
    Ok(())
}

async fn check(file: PathBuf, json: bool) -> Result<()> {
    let report = check_file(&file)
        .await
        .with_context(|| format!("Failed to check {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File:     {}", file.display());
    println!("Lines:    {}", report.total_lines);
    println!(
        "Matched:  {} ({:.1}%)",
        report.matched,
        report.match_ratio() * 100.0
    );
    println!("Skipped:  {}", report.skipped);
    println!("Crawlers: {}", report.bot_requests);

    Ok(())
}
