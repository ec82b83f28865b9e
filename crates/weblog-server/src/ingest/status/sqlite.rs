//! SQLite-backed status store
//!
//! Snapshots are upserted into the `ingest_jobs` table. WAL journaling lets the
//! status API read while the running job writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use uuid::Uuid;

use super::StatusStore;
use crate::ingest::error::StatusError;
use crate::ingest::jobs::{JobSnapshot, JobStatus};

/// Connections in the pool for file databases
const MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: String,
    status: String,
    source_file: String,
    indexed_count: i64,
    skipped_count: i64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
}

impl TryFrom<JobRow> for JobSnapshot {
    type Error = StatusError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| StatusError::Corrupt(format!("bad job id '{}': {}", row.id, e)))?;
        let status = JobStatus::from_str(&row.status).map_err(StatusError::Corrupt)?;

        Ok(Self {
            id,
            status,
            source_file: row.source_file,
            indexed_count: u64::try_from(row.indexed_count).unwrap_or(0),
            skipped_count: u64::try_from(row.skipped_count).unwrap_or(0),
            started_at: row.started_at,
            finished_at: row.finished_at,
            error_message: row.error_message,
        })
    }
}

/// Status records in a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteStatusStore {
    pool: SqlitePool,
}

impl SqliteStatusStore {
    /// Connect to (creating if needed) the database at `url` and run migrations
    pub async fn connect(url: &str) -> Result<Self, StatusError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database, mostly for tests
    ///
    /// A single connection that never expires, since every connection to
    /// `:memory:` would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self, StatusError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and bring its schema up to date
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StatusError> {
        sqlx::migrate!("../../migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl StatusStore for SqliteStatusStore {
    async fn write(&self, snapshot: &JobSnapshot) -> Result<(), StatusError> {
        sqlx::query(
            r#"
            INSERT INTO ingest_jobs (
                id, status, source_file, indexed_count, skipped_count,
                started_at, finished_at, error_message, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                source_file = excluded.source_file,
                indexed_count = excluded.indexed_count,
                skipped_count = excluded.skipped_count,
                started_at = excluded.started_at,
                finished_at = excluded.finished_at,
                error_message = excluded.error_message,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(snapshot.id.to_string())
        .bind(snapshot.status.as_str())
        .bind(&snapshot.source_file)
        .bind(i64::try_from(snapshot.indexed_count).unwrap_or(i64::MAX))
        .bind(i64::try_from(snapshot.skipped_count).unwrap_or(i64::MAX))
        .bind(snapshot.started_at)
        .bind(snapshot.finished_at)
        .bind(&snapshot.error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn read(&self, id: Uuid) -> Result<Option<JobSnapshot>, StatusError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, status, source_file, indexed_count, skipped_count,
                   started_at, finished_at, error_message
            FROM ingest_jobs
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(JobSnapshot::try_from).transpose()
    }
}
