//! Job queue orchestration tests
//!
//! FIFO dispatch, single concurrency, status visibility, crash and timeout
//! handling, and shutdown.

mod common;

use common::{
    lines_with_bad, log_line, wait_for, wait_for_terminal, write_log, FailingStatusStore,
    GatedSink, PanickingSink, RecordingStatusStore,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;
use weblog_server::ingest::{
    IngestWorker, JobQueue, JobStatus, MemoryStatusStore, QueueError, QueueSettings, StatusStore,
};
use weblog_server::search::{BulkSink, MemorySink};

fn spawn_queue(
    sink: Arc<dyn BulkSink>,
    status: Arc<dyn StatusStore>,
    batch_size: usize,
    job_timeout: Option<Duration>,
) -> (weblog_server::ingest::JobQueueHandle, tokio::task::JoinHandle<()>) {
    let worker = IngestWorker::new(sink, status, batch_size).unwrap();
    JobQueue::spawn(
        worker,
        QueueSettings {
            capacity: 64,
            job_timeout,
        },
    )
}

fn numbered_log(dir: &TempDir, name: &str, start: usize, count: usize) -> std::path::PathBuf {
    let lines: Vec<String> = (start..start + count).map(log_line).collect();
    write_log(dir.path(), name, &lines)
}

#[tokio::test]
async fn test_jobs_run_in_submission_order_without_overlap() {
    let dir = TempDir::new().unwrap();
    let sink = MemorySink::new();
    let status = Arc::new(RecordingStatusStore::new());
    let (queue, _task) = spawn_queue(Arc::new(sink.clone()), status.clone(), 2, None);

    let a = queue.submit(numbered_log(&dir, "a.log", 0, 7)).await.unwrap();
    let b = queue.submit(numbered_log(&dir, "b.log", 100, 7)).await.unwrap();
    let c = queue.submit(numbered_log(&dir, "c.log", 200, 7)).await.unwrap();

    for id in [a, b, c] {
        let snapshot = wait_for_terminal(&queue, id).await;
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.indexed_count, 7);
    }

    assert_eq!(status.start_order(), vec![a, b, c]);
    assert_eq!(status.max_running(), 1);

    // Each job's records form one contiguous run, A then B then C
    let urls: Vec<String> = sink.records().into_iter().map(|r| r.url).collect();
    let expected: Vec<String> = (0..7)
        .chain(100..107)
        .chain(200..207)
        .map(|i| format!("/product/{}", i))
        .collect();
    assert_eq!(urls, expected);

    // A finished before B started, B before C
    let writes = status.writes();
    let position = |id: Uuid, wanted: JobStatus| {
        writes
            .iter()
            .position(|s| s.id == id && s.status == wanted)
            .unwrap()
    };
    assert!(position(a, JobStatus::Completed) < position(b, JobStatus::Running));
    assert!(position(b, JobStatus::Completed) < position(c, JobStatus::Running));
}

#[tokio::test]
async fn test_concurrent_submissions_never_run_two_jobs() {
    let dir = TempDir::new().unwrap();
    let status = Arc::new(RecordingStatusStore::new());
    let (queue, _task) = spawn_queue(Arc::new(MemorySink::new()), status.clone(), 5, None);

    let mut submissions = Vec::new();
    for i in 0..10 {
        let queue = queue.clone();
        let path = numbered_log(&dir, &format!("{}.log", i), i * 100, 12);
        submissions.push(tokio::spawn(async move { queue.submit(path).await.unwrap() }));
    }

    let mut ids = Vec::new();
    for submission in submissions {
        ids.push(submission.await.unwrap());
    }

    for id in &ids {
        let snapshot = wait_for_terminal(&queue, *id).await;
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.indexed_count, 12);
    }

    assert_eq!(status.max_running(), 1);
    assert_eq!(status.start_order().len(), 10);
}

#[tokio::test]
async fn test_waiting_job_reports_queued() {
    let dir = TempDir::new().unwrap();
    let sink = GatedSink::closed();
    let status = Arc::new(MemoryStatusStore::new());
    let (queue, _task) = spawn_queue(Arc::new(sink.clone()), status, 500, None);

    let a = queue.submit(numbered_log(&dir, "a.log", 0, 3)).await.unwrap();
    wait_for(&queue, a, |s| s.status == JobStatus::Running).await;

    let b = queue.submit(numbered_log(&dir, "b.log", 10, 3)).await.unwrap();

    let snapshot = queue.status(b).await.unwrap().unwrap();
    assert_eq!(snapshot.status, JobStatus::Queued);
    assert_eq!(snapshot.indexed_count, 0);
    assert!(snapshot.started_at.is_none());

    let view = queue.snapshot().await.unwrap();
    assert_eq!(view.running, Some(a));
    assert_eq!(view.pending, vec![b]);

    sink.open_all();

    assert_eq!(wait_for_terminal(&queue, a).await.status, JobStatus::Completed);
    assert_eq!(wait_for_terminal(&queue, b).await.status, JobStatus::Completed);

    let view = queue.snapshot().await.unwrap();
    assert_eq!(view.running, None);
    assert!(view.pending.is_empty());
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let status = Arc::new(MemoryStatusStore::new());
    let (queue, _task) = spawn_queue(Arc::new(MemorySink::new()), status, 500, None);

    assert!(queue.status(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_submit_returns_while_job_is_running() {
    let dir = TempDir::new().unwrap();
    let sink = GatedSink::closed();
    let status = Arc::new(MemoryStatusStore::new());
    let (queue, _task) = spawn_queue(Arc::new(sink.clone()), status, 500, None);

    let a = queue.submit(numbered_log(&dir, "a.log", 0, 3)).await.unwrap();
    wait_for(&queue, a, |s| s.status == JobStatus::Running).await;

    // The running job is blocked on the sink; submission must still return
    let b = tokio::time::timeout(
        Duration::from_secs(2),
        queue.submit(numbered_log(&dir, "b.log", 10, 3)),
    )
    .await
    .expect("submit blocked on the running job")
    .unwrap();

    assert_ne!(a, b);
    sink.open_all();
    wait_for_terminal(&queue, b).await;
}

#[tokio::test]
async fn test_worker_panic_marks_job_error_and_queue_advances() {
    let dir = TempDir::new().unwrap();
    let sink = PanickingSink::on_call(2);
    let status = Arc::new(MemoryStatusStore::new());
    let (queue, _task) = spawn_queue(Arc::new(sink.clone()), status, 2, None);

    let crashed = queue.submit(numbered_log(&dir, "a.log", 0, 5)).await.unwrap();
    let next = queue.submit(numbered_log(&dir, "b.log", 100, 3)).await.unwrap();

    let snapshot = wait_for_terminal(&queue, crashed).await;
    assert_eq!(snapshot.status, JobStatus::Error);
    // First batch made it before the crash
    assert_eq!(snapshot.indexed_count, 2);
    assert!(snapshot.finished_at.is_some());
    let message = snapshot.error_message.unwrap();
    assert!(message.starts_with("worker crashed"), "unexpected message: {}", message);
    assert!(message.contains("sink exploded"));

    let snapshot = wait_for_terminal(&queue, next).await;
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.indexed_count, 3);
}

#[tokio::test]
async fn test_backend_failure_does_not_stop_queue() {
    let dir = TempDir::new().unwrap();
    let status = Arc::new(MemoryStatusStore::new());
    let (queue, _task) = spawn_queue(Arc::new(MemorySink::failing_on(1)), status, 500, None);

    let failed = queue.submit(numbered_log(&dir, "a.log", 0, 10)).await.unwrap();
    let next = queue.submit(numbered_log(&dir, "b.log", 100, 10)).await.unwrap();

    let snapshot = wait_for_terminal(&queue, failed).await;
    assert_eq!(snapshot.status, JobStatus::Error);
    assert_eq!(snapshot.indexed_count, 0);

    let snapshot = wait_for_terminal(&queue, next).await;
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.indexed_count, 10);
}

#[tokio::test]
async fn test_job_timeout_marks_error_and_queue_advances() {
    let dir = TempDir::new().unwrap();
    // Never opened: the first job blocks in its first bulk call
    let sink = GatedSink::closed();
    let status = Arc::new(MemoryStatusStore::new());
    let (queue, _task) = spawn_queue(
        Arc::new(sink.clone()),
        status,
        500,
        Some(Duration::from_millis(200)),
    );

    let stuck = queue.submit(numbered_log(&dir, "a.log", 0, 3)).await.unwrap();
    // Only unparseable lines, so no bulk call is needed
    let next = queue
        .submit(write_log(dir.path(), "b.log", &lines_with_bad(4, &[0, 1, 2, 3])))
        .await
        .unwrap();

    let snapshot = wait_for_terminal(&queue, stuck).await;
    assert_eq!(snapshot.status, JobStatus::Error);
    assert!(snapshot.error_message.unwrap().contains("timed out"));

    let snapshot = wait_for_terminal(&queue, next).await;
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.skipped_count, 4);
}

#[tokio::test]
async fn test_dropping_handles_finishes_running_job_and_leaves_pending_queued() {
    let dir = TempDir::new().unwrap();
    let sink = GatedSink::closed();
    let status = Arc::new(MemoryStatusStore::new());
    let (queue, task) = spawn_queue(Arc::new(sink.clone()), status.clone(), 500, None);

    let running = queue.submit(numbered_log(&dir, "a.log", 0, 3)).await.unwrap();
    wait_for(&queue, running, |s| s.status == JobStatus::Running).await;
    let pending = queue.submit(numbered_log(&dir, "b.log", 10, 3)).await.unwrap();
    // The loop has taken the submission before the handles go away
    assert_eq!(queue.snapshot().await.unwrap().pending, vec![pending]);

    drop(queue);
    sink.open_all();

    tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("queue did not stop")
        .unwrap();

    let snapshot = status.read(running).await.unwrap().unwrap();
    assert_eq!(snapshot.status, JobStatus::Completed);

    let snapshot = status.read(pending).await.unwrap().unwrap();
    assert_eq!(snapshot.status, JobStatus::Queued);
}

#[tokio::test]
async fn test_submit_after_shutdown_fails() {
    let status = Arc::new(MemoryStatusStore::new());
    let (queue, task) = spawn_queue(Arc::new(MemorySink::new()), status, 500, None);

    // Stop the loop while keeping a handle
    task.abort();
    let _ = task.await;

    let result = queue.submit("access.log").await;
    assert!(matches!(result, Err(QueueError::Shutdown)));
    assert!(matches!(queue.snapshot().await, Err(QueueError::Shutdown)));
}

async fn assert_status_failure_then_next_completes(status: Arc<FailingStatusStore>, indexed: u64) {
    let dir = TempDir::new().unwrap();
    let (queue, _task) = spawn_queue(Arc::new(MemorySink::new()), status.clone(), 5, None);

    let failed = queue.submit(numbered_log(&dir, "a.log", 0, 12)).await.unwrap();
    let next = queue.submit(numbered_log(&dir, "b.log", 100, 10)).await.unwrap();

    let snapshot = wait_for_terminal(&queue, failed).await;
    assert!(status.has_failed());
    assert_eq!(snapshot.status, JobStatus::Error);
    assert_eq!(snapshot.indexed_count, indexed);
    let message = snapshot.error_message.unwrap();
    assert!(message.contains("status update failed"), "unexpected message: {}", message);

    let snapshot = wait_for_terminal(&queue, next).await;
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.indexed_count, 10);

    let view = queue.snapshot().await.unwrap();
    assert_eq!(view.running, None);
    assert!(view.pending.is_empty());
}

#[tokio::test]
async fn test_failed_start_write_does_not_stop_queue() {
    assert_status_failure_then_next_completes(Arc::new(FailingStatusStore::on_start()), 0).await;
}

#[tokio::test]
async fn test_failed_progress_write_does_not_stop_queue() {
    assert_status_failure_then_next_completes(Arc::new(FailingStatusStore::on_progress()), 5)
        .await;
}
