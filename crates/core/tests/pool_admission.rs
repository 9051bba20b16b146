//! Worker pool admission integration tests.
//!
//! These tests verify the pool with mock collaborators:
//! - Concurrency never exceeds the worker bound
//! - Submissions beyond the queue depth are rejected immediately
//! - Shutdown drains queued and running jobs
//! - Shutdown gives up after its timeout

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use reelbot_core::{
    job::JobState,
    pool::{PoolConfig, PoolError, RejectReason, SubmitOutcome, WorkerPool},
    testing::{fixtures, ConcurrencyGauge, MockFetcher, MockSink, MockTransformer},
};

struct TestHarness {
    pool: Arc<WorkerPool>,
    fetcher: Arc<MockFetcher>,
    sink: Arc<MockSink>,
    gauge: Arc<ConcurrencyGauge>,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new(max_workers: usize, queue_depth: usize) -> Self {
        Self::with_config(PoolConfig::default().with_limits(max_workers, queue_depth))
    }

    fn with_config(config: PoolConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gauge = ConcurrencyGauge::new();
        let fetcher = Arc::new(MockFetcher::new().with_gauge(Arc::clone(&gauge)));
        let transformer = Arc::new(MockTransformer::new().with_gauge(Arc::clone(&gauge)));
        let sink = Arc::new(MockSink::new());

        let runner = fixtures::runner(
            temp_dir.path(),
            Arc::clone(&fetcher),
            transformer,
            Arc::clone(&sink),
        );
        let pool = Arc::new(WorkerPool::start(
            config.with_temp_dir(temp_dir.path()),
            runner,
        ));

        Self {
            pool,
            fetcher,
            sink,
            gauge,
            temp_dir,
        }
    }

    fn submit(&self, url: &str) -> SubmitOutcome {
        self.pool.submit(fixtures::api_job(url))
    }

    fn finished(&self) -> u64 {
        let status = self.pool.status();
        status.total_completed + status.total_failed
    }
}

/// Polls `condition` until it holds or five seconds pass.
async fn wait_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let harness = TestHarness::new(2, 16);
    harness.fetcher.set_delay(Duration::from_millis(30)).await;

    for i in 0..8 {
        let outcome = harness.submit(&format!("https://example.com/v{}", i));
        assert!(outcome.is_accepted());
    }

    wait_until(|| harness.finished() == 8).await;

    assert_eq!(harness.gauge.total(), 16); // one fetch and one transform per job
    assert!(harness.gauge.peak() <= 2, "peak was {}", harness.gauge.peak());
    assert_eq!(harness.pool.status().total_completed, 8);
    assert_eq!(harness.sink.files().await.len(), 8);
    assert!(fixtures::leftover_files(harness.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_panicking_sink_frees_worker_slots() {
    let harness = TestHarness::new(1, 2);
    harness.sink.set_panic_text(true);

    for i in 0..3 {
        assert!(harness.submit(&format!("https://example.com/p{}", i)).is_accepted());
    }

    wait_until(|| harness.finished() == 3).await;

    let status = harness.pool.status();
    assert_eq!(status.active_jobs, 0);
    assert_eq!(status.total_completed, 3);
    assert!(harness.pool.active_jobs().is_empty());
    assert!(harness.submit("https://example.com/after").is_accepted());
    wait_until(|| harness.finished() == 4).await;
}

#[tokio::test]
async fn test_rejects_beyond_queue_depth() {
    let harness = TestHarness::new(1, 2);
    harness.fetcher.hold();

    assert!(harness.submit("https://example.com/1").is_accepted());
    wait_until(|| harness.pool.status().active_jobs == 1).await;

    assert!(harness.submit("https://example.com/2").is_accepted());
    assert!(harness.submit("https://example.com/3").is_accepted());
    assert_eq!(harness.pool.status().queued_jobs, 2);

    assert_eq!(
        harness.submit("https://example.com/4"),
        SubmitOutcome::Rejected(RejectReason::Saturated)
    );
    assert_eq!(harness.pool.active_jobs().len(), 3);

    harness.fetcher.release();
    wait_until(|| harness.finished() == 3).await;
    assert_eq!(harness.pool.status().total_completed, 3);
    assert!(harness.pool.active_jobs().is_empty());
}

#[tokio::test]
async fn test_active_jobs_snapshot() {
    let harness = TestHarness::new(1, 4);
    harness.fetcher.hold();

    harness.submit("https://example.com/first");
    wait_until(|| {
        harness
            .pool
            .active_jobs()
            .first()
            .map(|job| job.state == JobState::Fetching)
            .unwrap_or(false)
    })
    .await;
    harness.submit("https://example.com/second");

    let jobs = harness.pool.active_jobs();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].source_url, "https://example.com/first");
    assert_eq!(jobs[0].state, JobState::Fetching);
    assert_eq!(jobs[1].source_url, "https://example.com/second");
    assert_eq!(jobs[1].state, JobState::Queued);

    harness.fetcher.release();
    wait_until(|| harness.finished() == 2).await;
}

#[tokio::test]
async fn test_failed_jobs_are_counted() {
    let harness = TestHarness::new(2, 4);
    harness.sink.set_fail_files(true);

    harness.submit("https://example.com/v1");
    wait_until(|| harness.finished() == 1).await;

    let status = harness.pool.status();
    assert_eq!(status.total_failed, 1);
    assert_eq!(status.total_completed, 0);
    assert_eq!(status.active_jobs, 0);
}

#[tokio::test]
async fn test_shutdown_drains_queued_jobs() {
    let harness = TestHarness::new(1, 4);
    harness.fetcher.hold();

    for i in 0..3 {
        assert!(harness
            .submit(&format!("https://example.com/v{}", i))
            .is_accepted());
    }

    let pool = Arc::clone(&harness.pool);
    let shutdown = tokio::spawn(async move { pool.shutdown().await });

    wait_until(|| !harness.pool.status().accepting).await;
    assert_eq!(
        harness.submit("https://example.com/late"),
        SubmitOutcome::Rejected(RejectReason::ShuttingDown)
    );

    harness.fetcher.release();
    shutdown.await.unwrap().expect("shutdown should drain");

    assert_eq!(harness.pool.status().total_completed, 3);
    assert_eq!(harness.sink.files().await.len(), 3);
    assert!(fixtures::leftover_files(harness.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_shutdown_times_out() {
    let harness =
        TestHarness::with_config(PoolConfig::default().with_limits(1, 1).with_shutdown_timeout(1));
    harness.fetcher.hold();

    harness.submit("https://example.com/stuck");
    wait_until(|| harness.pool.status().active_jobs == 1).await;

    let result = harness.pool.shutdown().await;
    assert!(matches!(
        result,
        Err(PoolError::ShutdownTimeout { pending: 1, .. })
    ));

    // Aborted jobs still release their artifacts.
    wait_until(|| fixtures::leftover_files(harness.temp_dir.path()).is_empty()).await;
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let harness = TestHarness::new(1, 1);
    harness.pool.shutdown().await.unwrap();
    harness.pool.shutdown().await.unwrap();
    assert!(!harness.pool.status().accepting);
}
