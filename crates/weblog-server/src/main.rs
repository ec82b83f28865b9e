//! Weblog Server - Main entry point

use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::{info, warn};
use weblog_common::logging::{init_logging, LogConfig};

use weblog_server::{
    api,
    config::Config,
    features::FeatureState,
    ingest::{self, IngestWorker, JobQueue, QueueSettings},
    search::ElasticClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Defaults for this binary, environment variables take precedence
    let log_config = LogConfig::builder()
        .log_file_prefix("weblog-server")
        .filter_directives("weblog_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting weblog server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let elastic = ElasticClient::new(config.elastic.clone())
        .context("Failed to build search store client")?;
    info!(url = %config.elastic.url, index = %config.elastic.index, "Search store client initialized");

    let status = ingest::status::open(&config.ingest)
        .await
        .context("Failed to open job status store")?;
    info!(backend = ?config.ingest.status_backend, "Job status store ready");

    tokio::fs::create_dir_all(&config.ingest.upload_dir)
        .await
        .context("Failed to create upload directory")?;

    let worker = IngestWorker::new(Arc::new(elastic.clone()), status, config.ingest.batch_size)?;
    let (queue, queue_task) = JobQueue::spawn(worker, QueueSettings::from(&config.ingest));

    let state = FeatureState {
        queue,
        elastic,
        upload_dir: config.ingest.upload_dir.clone(),
        max_upload_bytes: config.ingest.max_upload_bytes,
    };

    let app = api::create_router(state, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it every queue handle) is gone, so the queue stops
    // dispatching and only the running job is left to finish.
    let timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    info!("Waiting up to {} seconds for the running ingestion job", timeout.as_secs());

    match tokio::time::timeout(timeout, queue_task).await {
        Ok(Ok(())) => info!("Job queue drained"),
        Ok(Err(e)) => warn!("Job queue task failed: {}", e),
        Err(_) => warn!("Running ingestion job did not finish before shutdown timeout"),
    }

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
