//! Worker pool implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::job::{Job, JobId, JobState};
use crate::metrics;
use crate::pipeline::PipelineRunner;

use super::config::PoolConfig;
use super::types::{ActiveJob, PoolError, PoolStatus, RejectReason, SubmitOutcome};

type JobTable = Arc<RwLock<HashMap<JobId, ActiveJob>>>;

/// Tracks statistics for the pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_completed: AtomicU64,
    total_failed: AtomicU64,
}

impl PoolStats {
    fn publish(&self) {
        metrics::JOBS_ACTIVE.set(self.active.load(Ordering::Relaxed) as i64);
        metrics::JOBS_QUEUED.set(self.queued.load(Ordering::Relaxed) as i64);
    }
}

/// Bounded pool executing jobs through a shared [`PipelineRunner`].
pub struct WorkerPool {
    config: PoolConfig,
    sender: mpsc::Sender<Job>,
    accepting: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    stats: Arc<PoolStats>,
    jobs: JobTable,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Starts the pool. Must be called inside a Tokio runtime.
    ///
    /// Installs its own update callback on `runner` to track job states.
    pub fn start(config: PoolConfig, runner: PipelineRunner) -> Self {
        let max_workers = config.max_workers.max(1);
        let queue_depth = config.queue_depth.max(1);

        let (sender, receiver) = mpsc::channel(queue_depth);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(PoolStats::default());
        let jobs: JobTable = Arc::new(RwLock::new(HashMap::new()));

        let tracked = Arc::clone(&jobs);
        let runner = runner.with_update_callback(Arc::new(move |id: &JobId, state: JobState| {
            if let Ok(mut jobs) = tracked.write() {
                if let Some(job) = jobs.get_mut(id) {
                    job.state = state;
                }
            }
        }));

        let dispatcher = Dispatcher {
            receiver,
            shutdown_rx,
            semaphore: Arc::new(Semaphore::new(max_workers)),
            runner: Arc::new(runner),
            stats: Arc::clone(&stats),
            jobs: Arc::clone(&jobs),
        };
        let handle = tokio::spawn(dispatcher.run());

        info!(max_workers, queue_depth, "Worker pool started");

        Self {
            config,
            sender,
            accepting: AtomicBool::new(true),
            shutdown_tx,
            stats,
            jobs,
            dispatcher: Mutex::new(Some(handle)),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Queues a job for execution. Never waits.
    pub fn submit(&self, job: Job) -> SubmitOutcome {
        let origin = job.origin.kind();
        if !self.is_accepting() {
            return self.reject(origin, &job, RejectReason::ShuttingDown);
        }

        let id = job.id;
        let snapshot = ActiveJob {
            id,
            origin: job.origin.clone(),
            source_url: job.source_url.clone(),
            state: job.state(),
            submitted_at: job.timings().submitted_at,
        };

        self.stats.queued.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut jobs) = self.jobs.write() {
            jobs.insert(id, snapshot);
        }

        match self.sender.try_send(job) {
            Ok(()) => {
                self.stats.publish();
                metrics::JOBS_SUBMITTED
                    .with_label_values(&[origin, "accepted"])
                    .inc();
                debug!(job_id = %id, origin, "Job queued");
                SubmitOutcome::Accepted(id)
            }
            Err(e) => {
                self.stats.queued.fetch_sub(1, Ordering::SeqCst);
                if let Ok(mut jobs) = self.jobs.write() {
                    jobs.remove(&id);
                }
                let (reason, job) = match e {
                    TrySendError::Full(job) => (RejectReason::Saturated, job),
                    TrySendError::Closed(job) => (RejectReason::ShuttingDown, job),
                };
                self.reject(origin, &job, reason)
            }
        }
    }

    fn reject(&self, origin: &str, job: &Job, reason: RejectReason) -> SubmitOutcome {
        metrics::JOBS_SUBMITTED
            .with_label_values(&[origin, reason.as_str()])
            .inc();
        warn!(
            url = %job.source_url,
            origin,
            kind = %reason.error_kind(),
            reason = reason.as_str(),
            "Job rejected"
        );
        SubmitOutcome::Rejected(reason)
    }

    /// Current counters.
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            accepting: self.is_accepting(),
            max_workers: self.config.max_workers,
            queue_depth: self.config.queue_depth,
            active_jobs: self.stats.active.load(Ordering::SeqCst) as usize,
            queued_jobs: self.stats.queued.load(Ordering::SeqCst) as usize,
            total_completed: self.stats.total_completed.load(Ordering::SeqCst),
            total_failed: self.stats.total_failed.load(Ordering::SeqCst),
        }
    }

    /// Accepted jobs that have not finished, oldest first.
    pub fn active_jobs(&self) -> Vec<ActiveJob> {
        let mut jobs: Vec<ActiveJob> = self
            .jobs
            .read()
            .map(|jobs| jobs.values().cloned().collect())
            .unwrap_or_default();
        jobs.sort_by_key(|job| job.submitted_at);
        jobs
    }

    /// Stops intake and waits for queued and running jobs to finish.
    ///
    /// On timeout the remaining jobs are aborted; their artifacts are still
    /// removed when their tasks are dropped.
    pub async fn shutdown(&self) -> Result<(), PoolError> {
        if self.accepting.swap(false, Ordering::SeqCst) {
            let status = self.status();
            info!(
                active = status.active_jobs,
                queued = status.queued_jobs,
                "Worker pool shutting down"
            );
        }
        self.shutdown_tx.send_replace(true);

        let Some(mut handle) = self.dispatcher.lock().await.take() else {
            return Ok(());
        };

        let timeout = self.config.shutdown_timeout();
        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => {
                info!("Worker pool stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(PoolError::Dispatcher(e.to_string())),
            Err(_) => {
                let status = self.status();
                let pending = status.active_jobs + status.queued_jobs;
                handle.abort();
                error!(
                    pending,
                    timeout_secs = self.config.shutdown_timeout_secs,
                    "Worker pool shutdown timed out"
                );
                Err(PoolError::ShutdownTimeout {
                    timeout_secs: self.config.shutdown_timeout_secs,
                    pending,
                })
            }
        }
    }
}

enum Next<T> {
    Ready(T),
    Shutdown,
    Closed,
}

/// Moves jobs from the queue onto worker slots.
struct Dispatcher {
    receiver: mpsc::Receiver<Job>,
    shutdown_rx: watch::Receiver<bool>,
    semaphore: Arc<Semaphore>,
    runner: Arc<PipelineRunner>,
    stats: Arc<PoolStats>,
    jobs: JobTable,
}

impl Dispatcher {
    async fn run(mut self) {
        let mut tasks = JoinSet::new();
        let mut closing = false;

        loop {
            // A slot is reserved before a job leaves the queue, so queued jobs
            // stay counted against the queue depth until they can start.
            let next = tokio::select! {
                _ = self.shutdown_rx.changed(), if !closing => Next::Shutdown,
                permit = Arc::clone(&self.semaphore).acquire_owned() => match permit {
                    Ok(permit) => Next::Ready(permit),
                    Err(_) => Next::Closed,
                },
            };
            let permit = match next {
                Next::Ready(permit) => permit,
                Next::Shutdown => {
                    self.receiver.close();
                    closing = true;
                    continue;
                }
                Next::Closed => break,
            };

            let next = tokio::select! {
                _ = self.shutdown_rx.changed(), if !closing => Next::Shutdown,
                job = self.receiver.recv() => job.map_or(Next::Closed, Next::Ready),
            };
            let job = match next {
                Next::Ready(job) => job,
                Next::Shutdown => {
                    self.receiver.close();
                    closing = true;
                    continue;
                }
                Next::Closed => break,
            };

            self.spawn_job(&mut tasks, job, permit);

            while let Some(result) = tasks.try_join_next() {
                log_join_result(result);
            }
        }

        debug!(remaining = tasks.len(), "Dispatcher draining running jobs");
        while let Some(result) = tasks.join_next().await {
            log_join_result(result);
        }
    }

    fn spawn_job(&self, tasks: &mut JoinSet<()>, job: Job, permit: OwnedSemaphorePermit) {
        self.stats.queued.fetch_sub(1, Ordering::SeqCst);
        self.stats.active.fetch_add(1, Ordering::SeqCst);
        self.stats.publish();

        let runner = Arc::clone(&self.runner);
        let stats = Arc::clone(&self.stats);
        let jobs = Arc::clone(&self.jobs);

        tasks.spawn(async move {
            let _permit = permit;
            let report = runner.run_job(job).await;

            if let Ok(mut jobs) = jobs.write() {
                jobs.remove(&report.id);
            }
            stats.active.fetch_sub(1, Ordering::SeqCst);
            if report.succeeded() {
                stats.total_completed.fetch_add(1, Ordering::SeqCst);
            } else {
                stats.total_failed.fetch_add(1, Ordering::SeqCst);
            }
            stats.publish();
        });
    }
}

fn log_join_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!(error = %e, "Worker task panicked");
        } else {
            debug!(error = %e, "Worker task cancelled");
        }
    }
}
