//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job admission (accepted, rejected)
//! - Job outcomes by origin and error kind
//! - Per-stage durations (fetch, transform, deliver)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Admission Metrics
// =============================================================================

/// Job submissions by result.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelbot_jobs_submitted_total", "Total job submissions"),
        &["origin", "result"], // result: "accepted", "saturated", "shutting_down"
    )
    .unwrap()
});

/// Jobs waiting for a worker.
pub static JOBS_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("reelbot_jobs_queued", "Jobs waiting for a worker").unwrap()
});

/// Jobs currently being processed.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("reelbot_jobs_active", "Jobs currently being processed").unwrap()
});

// =============================================================================
// Outcome Metrics
// =============================================================================

/// Finished jobs by origin and outcome.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelbot_jobs_finished_total", "Total finished jobs"),
        &["origin", "outcome"], // outcome: "completed" or an error kind
    )
    .unwrap()
});

/// Job wall-clock duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("reelbot_job_duration_seconds", "End-to-end job duration")
            .buckets(vec![5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("reelbot_stage_duration_seconds", "Duration of pipeline stages")
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["stage", "result"], // result: "success", "failure"
    )
    .unwrap()
});

/// Notifications that could not be sent.
pub static NOTIFICATION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelbot_notification_failures_total",
            "Progress or result messages that could not be sent",
        ),
        &["kind"], // "started", "result"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_QUEUED.clone()),
        Box::new(JOBS_ACTIVE.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(NOTIFICATION_FAILURES.clone()),
    ]
}
