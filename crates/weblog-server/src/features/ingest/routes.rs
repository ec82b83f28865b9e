//! Ingest routes
//!
//! - `POST /upload` - multipart upload (field `logfile`), queued for ingestion
//! - `GET /status/:job_id` - latest job snapshot
//! - `GET /queue` - running and pending job ids

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::io;
use std::path::Path as FsPath;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::commands::{
    submit::{handle as handle_submit, upload_file_name, DEFAULT_UPLOAD_NAME},
    SubmitIngestCommand, SubmitIngestError,
};
use super::queries::{
    get_queue::handle as handle_get_queue, get_status::handle as handle_get_status,
    GetIngestStatusError, GetIngestStatusQuery, GetQueueError, GetQueueQuery,
};
use super::IngestState;
use crate::error::AppError;

/// Multipart field carrying the log file
pub const UPLOAD_FIELD: &str = "logfile";

/// Name suffixes tried before giving up on a crowded millisecond
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Create ingest routes
pub fn ingest_routes(max_upload_bytes: usize) -> Router<IngestState> {
    Router::new()
        .route(
            "/upload",
            post(upload_log).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/status/:job_id", get(get_status))
        .route("/queue", get(get_queue))
}

/// Save the uploaded file and queue it
///
/// POST /upload
#[tracing::instrument(skip(state, multipart))]
async fn upload_log(
    State(state): State<IngestState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart body", e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original = field.file_name().unwrap_or(DEFAULT_UPLOAD_NAME).to_string();

        tokio::fs::create_dir_all(&state.upload_dir).await?;
        let (file, file_name) =
            create_upload(&state.upload_dir, &original, Utc::now().timestamp_millis()).await?;
        let path = state.upload_dir.join(&file_name);
        let size = save_field(&path, file, field).await?;

        tracing::info!(file = %file_name, size, "Log file uploaded");

        let command = SubmitIngestCommand {
            source_file: path,
            file_name,
        };
        let response = handle_submit(state.queue.clone(), command).await?;

        return Ok((StatusCode::OK, Json(response)).into_response());
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}

/// Create a new upload file in `dir`, never reusing an existing name
///
/// Returns the open file and its stored name.
async fn create_upload(dir: &FsPath, original: &str, millis: i64) -> io::Result<(File, String)> {
    let mut attempt = 0;
    loop {
        let file_name = upload_file_name(original, millis, attempt);
        let opened = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&file_name))
            .await;

        match opened {
            Ok(file) => return Ok((file, file_name)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                attempt += 1;
            },
            Err(e) => return Err(e),
        }
    }
}

/// Stream a multipart field into `file`, removing the partial file on failure
async fn save_field(path: &FsPath, mut file: File, mut field: Field<'_>) -> Result<u64, AppError> {
    let mut written = 0u64;

    let result: Result<(), AppError> = async {
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error("Failed to read upload", e))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(())
    }
    .await;

    if let Err(e) = result {
        drop(file);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partial upload");
        }
        return Err(e);
    }

    Ok(written)
}

/// Body-limit violations surface as multipart errors carrying 413
fn multipart_error(context: &str, err: MultipartError) -> AppError {
    let message = format!("{}: {}", context, err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(message)
    } else {
        AppError::BadRequest(message)
    }
}

/// Get the latest snapshot of a job
///
/// GET /status/:job_id
async fn get_status(
    State(state): State<IngestState>,
    Path(job_id): Path<String>,
) -> Result<Response, AppError> {
    let query = GetIngestStatusQuery { job_id };
    let snapshot = handle_get_status(state.queue, query).await?;

    Ok((StatusCode::OK, Json(snapshot)).into_response())
}

/// Running and pending jobs
///
/// GET /queue
async fn get_queue(State(state): State<IngestState>) -> Result<Response, AppError> {
    let snapshot = handle_get_queue(state.queue, GetQueueQuery).await?;

    Ok((StatusCode::OK, Json(snapshot)).into_response())
}

impl From<SubmitIngestError> for AppError {
    fn from(err: SubmitIngestError) -> Self {
        match err {
            SubmitIngestError::Queue(e) => AppError::Queue(e),
        }
    }
}

impl From<GetIngestStatusError> for AppError {
    fn from(err: GetIngestStatusError) -> Self {
        match err {
            GetIngestStatusError::NotFound => AppError::NotFound("Job not found".to_string()),
            GetIngestStatusError::Queue(e) => AppError::Queue(e),
        }
    }
}

impl From<GetQueueError> for AppError {
    fn from(err: GetQueueError) -> Self {
        match err {
            GetQueueError::Queue(e) => AppError::Queue(e),
        }
    }
}
