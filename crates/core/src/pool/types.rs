//! Types for the pool module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::job::{ErrorKind, JobId, JobOrigin, JobState};

/// Result of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(JobId),
    Rejected(RejectReason),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// All workers busy and the queue is full.
    Saturated,
    /// The pool no longer accepts work.
    ShuttingDown,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saturated => "saturated",
            Self::ShuttingDown => "shutting_down",
        }
    }

    pub fn error_kind(&self) -> ErrorKind {
        ErrorKind::PoolSaturated
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saturated => f.write_str("too many jobs in progress, try again later"),
            Self::ShuttingDown => f.write_str("service is shutting down, try again later"),
        }
    }
}

/// Snapshot of the pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub accepting: bool,
    pub max_workers: usize,
    pub queue_depth: usize,
    pub active_jobs: usize,
    pub queued_jobs: usize,
    pub total_completed: u64,
    pub total_failed: u64,
}

/// A job that has been accepted and has not finished yet.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveJob {
    pub id: JobId,
    pub origin: JobOrigin,
    pub source_url: String,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
}

/// Errors from pool lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Jobs were still running when the shutdown timeout elapsed.
    #[error("Shutdown timed out after {timeout_secs} seconds with {pending} job(s) unfinished")]
    ShutdownTimeout { timeout_secs: u64, pending: usize },

    /// The dispatcher task ended abnormally.
    #[error("Dispatcher failed: {0}")]
    Dispatcher(String),
}
