//! Types for the job module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Process-unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// File name for the fetched artifact.
    pub fn fetched_file_name(&self) -> String {
        format!("{}.mp4", self.0)
    }

    /// File name for the transformed artifact.
    pub fn transformed_file_name(&self) -> String {
        format!("{}_processed.mp4", self.0)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which ingress path submitted a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobOrigin {
    /// Chat message from a bot user.
    Bot { user_id: i64 },
    /// HTTP API request.
    Api { method: String },
}

impl JobOrigin {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bot { .. } => "bot",
            Self::Api { .. } => "api",
        }
    }
}

impl fmt::Display for JobOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bot { user_id } => write!(f, "Telegram User: {}", user_id),
            Self::Api { method } => write!(f, "API-{}", method),
        }
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Fetching,
    Transforming,
    Delivering,
    Completed,
    Failed,
}

impl JobState {
    /// The only state reachable from this one on the success path.
    pub fn successor(&self) -> Option<JobState> {
        match self {
            Self::Queued => Some(Self::Fetching),
            Self::Fetching => Some(Self::Transforming),
            Self::Transforming => Some(Self::Delivering),
            Self::Delivering => Some(Self::Completed),
            Self::Completed | Self::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether time spent in this state is a pipeline stage.
    pub fn is_stage(&self) -> bool {
        matches!(self, Self::Fetching | Self::Transforming | Self::Delivering)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Transforming => "transforming",
            Self::Delivering => "delivering",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error taxonomy shared by ingress, admission and the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    FetchFailed,
    FetchIncomplete,
    TransformFailed,
    TransformIncomplete,
    DeliveryFailed,
    PoolSaturated,
    NotificationTransient,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::FetchFailed => "fetch_failed",
            Self::FetchIncomplete => "fetch_incomplete",
            Self::TransformFailed => "transform_failed",
            Self::TransformIncomplete => "transform_incomplete",
            Self::DeliveryFailed => "delivery_failed",
            Self::PoolSaturated => "pool_saturated",
            Self::NotificationTransient => "notification_transient",
            Self::Internal => "internal",
        }
    }

    /// Human-readable headline for the failure notice.
    pub fn headline(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "The URL is not valid",
            Self::FetchFailed => "Download failed",
            Self::FetchIncomplete => "Download finished but produced no file",
            Self::TransformFailed => "Video processing failed",
            Self::TransformIncomplete => "Video processing produced no output",
            Self::DeliveryFailed => "Uploading the processed video failed",
            Self::PoolSaturated => "Too many requests in progress",
            Self::NotificationTransient => "Could not send a progress message",
            Self::Internal => "An unexpected error occurred",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a job ended in [`JobState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: ErrorKind,
    /// Short diagnostic, already trimmed for display.
    pub detail: String,
}

impl FailureReason {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.detail)
        }
    }
}

/// Start and end of one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub state: JobState,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl StageTiming {
    /// Duration in milliseconds, if the stage finished.
    pub fn duration_ms(&self) -> Option<u64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds().max(0) as u64)
    }
}

/// Timestamps collected over a job's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTimings {
    pub submitted_at: DateTime<Utc>,
    pub stages: Vec<StageTiming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobTimings {
    fn new() -> Self {
        Self {
            submitted_at: Utc::now(),
            stages: Vec::new(),
            finished_at: None,
        }
    }

    fn close_open_stage(&mut self, now: DateTime<Utc>) {
        if let Some(stage) = self.stages.last_mut() {
            if stage.finished_at.is_none() {
                stage.finished_at = Some(now);
            }
        }
    }

    /// Timing of the given stage, if it ran.
    pub fn stage(&self, state: JobState) -> Option<&StageTiming> {
        self.stages.iter().find(|s| s.state == state)
    }
}

/// Attempted transition that would move a job backwards or out of a
/// terminal state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid job transition {from} -> {to}")]
pub struct TransitionError {
    pub from: JobState,
    pub to: JobState,
}

/// The unit of work tracking one request end-to-end.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub source_url: String,
    pub origin: JobOrigin,
    state: JobState,
    /// Fetched artifact, once allocated.
    pub fetched_path: Option<PathBuf>,
    /// Transformed artifact, once allocated.
    pub transformed_path: Option<PathBuf>,
    failure: Option<FailureReason>,
    timings: JobTimings,
}

impl Job {
    /// Creates a queued job. `source_url` must already be validated.
    pub fn new(source_url: impl Into<String>, origin: JobOrigin) -> Self {
        Self {
            id: JobId::new(),
            source_url: source_url.into(),
            origin,
            state: JobState::Queued,
            fetched_path: None,
            transformed_path: None,
            failure: None,
            timings: JobTimings::new(),
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    pub fn timings(&self) -> &JobTimings {
        &self.timings
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Moves the job to the next state on the success path.
    pub fn advance(&mut self, next: JobState) -> Result<(), TransitionError> {
        if self.state.successor() != Some(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }

        let now = Utc::now();
        self.timings.close_open_stage(now);
        if next.is_stage() {
            self.timings.stages.push(StageTiming {
                state: next,
                started_at: now,
                finished_at: None,
            });
        }
        if next.is_terminal() {
            self.timings.finished_at = Some(now);
        }
        self.state = next;
        Ok(())
    }

    /// Marks the job failed. Fails only if the job is already terminal.
    pub fn fail(&mut self, reason: FailureReason) -> Result<(), TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError {
                from: self.state,
                to: JobState::Failed,
            });
        }

        let now = Utc::now();
        self.timings.close_open_stage(now);
        self.timings.finished_at = Some(now);
        self.state = JobState::Failed;
        self.failure = Some(reason);
        Ok(())
    }

    /// Consumes the job into its report.
    pub fn into_report(self) -> JobReport {
        let total_duration_ms = self
            .timings
            .finished_at
            .map(|end| (end - self.timings.submitted_at).num_milliseconds().max(0) as u64);

        JobReport {
            id: self.id,
            origin: self.origin,
            source_url: self.source_url,
            state: self.state,
            failure: self.failure,
            timings: self.timings,
            total_duration_ms,
        }
    }
}

/// Outcome of a job after the pipeline released it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub id: JobId,
    pub origin: JobOrigin,
    pub source_url: String,
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    pub timings: JobTimings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<u64>,
}

impl JobReport {
    pub fn succeeded(&self) -> bool {
        self.state == JobState::Completed
    }

    pub fn failure_kind(&self) -> Option<ErrorKind> {
        self.failure.as_ref().map(|f| f.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_job() -> Job {
        Job::new(
            "https://example.com/v1",
            JobOrigin::Api {
                method: "POST".to_string(),
            },
        )
    }

    #[test]
    fn test_ids_are_unique_and_name_artifacts() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert_eq!(a.fetched_file_name(), format!("{}.mp4", a));
        assert_eq!(a.transformed_file_name(), format!("{}_processed.mp4", a));
        assert_ne!(a.fetched_file_name(), b.fetched_file_name());
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(JobOrigin::Bot { user_id: 7 }.to_string(), "Telegram User: 7");
        assert_eq!(
            JobOrigin::Api {
                method: "GET".to_string()
            }
            .to_string(),
            "API-GET"
        );
    }

    #[test]
    fn test_full_success_path() {
        let mut job = api_job();
        assert_eq!(job.state(), JobState::Queued);

        job.advance(JobState::Fetching).unwrap();
        job.advance(JobState::Transforming).unwrap();
        job.advance(JobState::Delivering).unwrap();
        job.advance(JobState::Completed).unwrap();

        assert!(job.is_terminal());
        assert_eq!(job.timings().stages.len(), 3);
        assert!(job.timings().stages.iter().all(|s| s.finished_at.is_some()));
        assert!(job.timings().finished_at.is_some());
    }

    #[test]
    fn test_cannot_skip_or_go_back() {
        let mut job = api_job();
        let err = job.advance(JobState::Transforming).unwrap_err();
        assert_eq!(err.from, JobState::Queued);

        job.advance(JobState::Fetching).unwrap();
        assert!(job.advance(JobState::Fetching).is_err());
        assert!(job.advance(JobState::Queued).is_err());
    }

    #[test]
    fn test_failed_is_absorbing() {
        let mut job = api_job();
        job.advance(JobState::Fetching).unwrap();
        job.fail(FailureReason::new(ErrorKind::FetchFailed, "404"))
            .unwrap();

        assert_eq!(job.state(), JobState::Failed);
        assert!(job.advance(JobState::Transforming).is_err());
        assert!(job
            .fail(FailureReason::new(ErrorKind::Internal, "again"))
            .is_err());
        assert_eq!(job.failure().unwrap().kind, ErrorKind::FetchFailed);
    }

    #[test]
    fn test_completed_cannot_fail() {
        let mut job = api_job();
        for next in [
            JobState::Fetching,
            JobState::Transforming,
            JobState::Delivering,
            JobState::Completed,
        ] {
            job.advance(next).unwrap();
        }
        assert!(job
            .fail(FailureReason::new(ErrorKind::DeliveryFailed, ""))
            .is_err());
    }

    #[test]
    fn test_report_serialization() {
        let mut job = api_job();
        job.advance(JobState::Fetching).unwrap();
        job.fail(FailureReason::new(ErrorKind::FetchIncomplete, "empty file"))
            .unwrap();

        let report = job.into_report();
        assert!(!report.succeeded());
        assert_eq!(report.failure_kind(), Some(ErrorKind::FetchIncomplete));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"state\":\"failed\""));
        assert!(json.contains("\"kind\":\"fetch_incomplete\""));
        assert!(json.contains("\"kind\":\"api\""));
    }
}
