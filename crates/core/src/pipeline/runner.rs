//! Stage sequencing for a single job.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::fetcher::Fetcher;
use crate::job::{
    diagnostic_excerpt, ErrorKind, FailureReason, Job, JobId, JobReport, JobState,
};
use crate::metrics;
use crate::notifier::{NotificationSink, Recipient};
use crate::transformer::Transformer;

use super::config::PipelineConfig;
use super::messages::{failure_message, started_message, TRANSFORM_EXCERPT_LINES};
use super::workspace::ArtifactWorkspace;

/// Observer invoked on every state change of a running job.
pub type UpdateCallback = Arc<dyn Fn(&JobId, JobState) + Send + Sync>;

/// Runs jobs through fetch, transform and deliver.
///
/// One runner is shared by all workers; it holds no per-job state.
pub struct PipelineRunner {
    config: PipelineConfig,
    fetcher: Arc<dyn Fetcher>,
    transformer: Arc<dyn Transformer>,
    sink: Arc<dyn NotificationSink>,
    recipient: Recipient,
    on_update: Option<UpdateCallback>,
}

impl PipelineRunner {
    pub fn new(
        config: PipelineConfig,
        fetcher: Arc<dyn Fetcher>,
        transformer: Arc<dyn Transformer>,
        sink: Arc<dyn NotificationSink>,
        recipient: Recipient,
    ) -> Self {
        Self {
            config,
            fetcher,
            transformer,
            sink,
            recipient,
            on_update: None,
        }
    }

    /// Registers an observer for state changes.
    pub fn with_update_callback(mut self, callback: UpdateCallback) -> Self {
        self.on_update = Some(callback);
        self
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    pub fn sink(&self) -> &Arc<dyn NotificationSink> {
        &self.sink
    }

    /// Runs `job` to a terminal state and releases its artifacts.
    ///
    /// Never fails and never panics past this call, even when a collaborator
    /// panics. The outcome is in the returned report.
    pub async fn run_job(&self, mut job: Job) -> JobReport {
        info!(
            job_id = %job.id,
            origin = %job.origin,
            url = %job.source_url,
            "Job started"
        );

        self.notify_started(&job).await;

        let mut workspace = ArtifactWorkspace::new(&self.config.temp_dir);
        let outcome = AssertUnwindSafe(self.run_stages(&mut job, &mut workspace))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(reason)) => Some(reason),
            Err(panic) => Some(FailureReason::new(
                ErrorKind::Internal,
                panic_message("stage", panic.as_ref()),
            )),
        };

        if let Some(reason) = failure {
            if let Err(e) = job.fail(reason.clone()) {
                warn!(job_id = %job.id, error = %e, "Could not mark job failed");
            }
            self.publish(&job.id, JobState::Failed);
            self.notify_failure(&job, &reason).await;
        }

        let removed = workspace.cleanup().await;
        debug!(job_id = %job.id, removed, "Job artifacts cleaned up");

        let origin_kind = job.origin.kind();
        let report = job.into_report();
        record_outcome(origin_kind, &report);

        match &report.failure {
            None => info!(
                job_id = %report.id,
                duration_ms = report.total_duration_ms.unwrap_or(0),
                "Job completed"
            ),
            Some(reason) => warn!(
                job_id = %report.id,
                kind = %reason.kind,
                duration_ms = report.total_duration_ms.unwrap_or(0),
                "Job failed"
            ),
        }

        report
    }

    async fn run_stages(
        &self,
        job: &mut Job,
        workspace: &mut ArtifactWorkspace,
    ) -> Result<(), FailureReason> {
        workspace.prepare().await.map_err(|e| {
            FailureReason::new(
                ErrorKind::Internal,
                format!("cannot create work directory: {}", e),
            )
        })?;

        // Fetch
        self.enter(job, JobState::Fetching)?;
        let fetched = workspace.allocate(&job.id.fetched_file_name());
        job.fetched_path = Some(fetched.clone());

        let started = Instant::now();
        if let Err(e) = self.fetcher.fetch(&job.source_url, &fetched).await {
            record_stage("fetch", false, started);
            error!(
                job_id = %job.id,
                fetcher = self.fetcher.name(),
                error = %e,
                stderr = e.diagnostics().unwrap_or_default(),
                "Fetch failed"
            );
            return Err(FailureReason::new(
                ErrorKind::FetchFailed,
                describe(e.to_string(), e.diagnostics()),
            ));
        }
        if !is_non_empty(&fetched).await {
            record_stage("fetch", false, started);
            error!(job_id = %job.id, path = %fetched.display(), "Fetched artifact missing or empty");
            return Err(FailureReason::new(
                ErrorKind::FetchIncomplete,
                "downloaded file is missing or empty",
            ));
        }
        record_stage("fetch", true, started);

        // Transform
        self.enter(job, JobState::Transforming)?;
        let transformed = workspace.allocate(&job.id.transformed_file_name());
        job.transformed_path = Some(transformed.clone());

        let started = Instant::now();
        match self.transformer.transform(&fetched, &transformed).await {
            Ok(report) => debug!(
                job_id = %job.id,
                source_secs = report.source_duration_secs,
                output_secs = report.output_duration_secs,
                "Transform finished"
            ),
            Err(e) => {
                record_stage("transform", false, started);
                error!(
                    job_id = %job.id,
                    transformer = self.transformer.name(),
                    error = %e,
                    stderr = e.diagnostics().unwrap_or_default(),
                    "Transform failed"
                );
                return Err(FailureReason::new(
                    ErrorKind::TransformFailed,
                    describe(e.to_string(), e.diagnostics()),
                ));
            }
        }
        if !is_non_empty(&transformed).await {
            record_stage("transform", false, started);
            error!(job_id = %job.id, path = %transformed.display(), "Transformed artifact missing or empty");
            return Err(FailureReason::new(
                ErrorKind::TransformIncomplete,
                "processed file is missing or empty",
            ));
        }
        record_stage("transform", true, started);

        // Deliver
        self.enter(job, JobState::Delivering)?;
        let started = Instant::now();
        if let Err(e) = self
            .sink
            .send_file(&self.recipient, &transformed, &self.config.delivery_timeouts)
            .await
        {
            record_stage("deliver", false, started);
            error!(
                job_id = %job.id,
                sink = self.sink.name(),
                error = %e,
                "Delivery failed"
            );
            return Err(FailureReason::new(ErrorKind::DeliveryFailed, e.to_string()));
        }
        record_stage("deliver", true, started);

        self.enter(job, JobState::Completed)
    }

    fn enter(&self, job: &mut Job, next: JobState) -> Result<(), FailureReason> {
        job.advance(next)
            .map_err(|e| FailureReason::new(ErrorKind::Internal, e.to_string()))?;
        debug!(job_id = %job.id, state = %next, "Job state changed");
        self.publish(&job.id, next);
        Ok(())
    }

    fn publish(&self, id: &JobId, state: JobState) {
        if let Some(callback) = &self.on_update {
            callback(id, state);
        }
    }

    async fn notify_started(&self, job: &Job) {
        let text = started_message(job);
        let sent = AssertUnwindSafe(self.sink.send_text(&self.recipient, &text))
            .catch_unwind()
            .await;
        let error = match sent {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message("sink", panic.as_ref()),
        };
        metrics::NOTIFICATION_FAILURES
            .with_label_values(&["started"])
            .inc();
        warn!(
            job_id = %job.id,
            kind = %ErrorKind::NotificationTransient,
            error = %error,
            "Failed to send processing message"
        );
    }

    async fn notify_failure(&self, job: &Job, reason: &FailureReason) {
        let text = failure_message(job, reason);
        let sent = AssertUnwindSafe(self.sink.send_text(&self.recipient, &text))
            .catch_unwind()
            .await;
        let error = match sent {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message("sink", panic.as_ref()),
        };
        metrics::NOTIFICATION_FAILURES
            .with_label_values(&["result"])
            .inc();
        error!(job_id = %job.id, error = %error, "Failed to send failure message");
    }
}

/// Short user-facing detail: the error plus the tail of the tool's output.
fn describe(summary: String, diagnostics: Option<&str>) -> String {
    match diagnostics
        .map(|d| diagnostic_excerpt(d, TRANSFORM_EXCERPT_LINES))
        .filter(|excerpt| !excerpt.is_empty())
    {
        Some(excerpt) => format!("{}\n{}", summary, excerpt),
        None => summary,
    }
}

async fn is_non_empty(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

fn panic_message(what: &str, payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("{} panicked: {}", what, s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("{} panicked: {}", what, s)
    } else {
        format!("{} panicked", what)
    }
}

fn record_stage(stage: &str, success: bool, started: Instant) {
    let result = if success { "success" } else { "failure" };
    metrics::STAGE_DURATION
        .with_label_values(&[stage, result])
        .observe(started.elapsed().as_secs_f64());
}

fn record_outcome(origin: &str, report: &JobReport) {
    let outcome = report
        .failure_kind()
        .map(|k| k.as_str())
        .unwrap_or("completed");
    metrics::JOBS_FINISHED
        .with_label_values(&[origin, outcome])
        .inc();
    if let Some(ms) = report.total_duration_ms {
        metrics::JOB_DURATION
            .with_label_values(&[outcome])
            .observe(ms as f64 / 1000.0);
    }
}
