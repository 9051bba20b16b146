//! Pool module: bounded admission and execution of jobs.
//!
//! A single [`WorkerPool`] serves every ingress path. Submissions never
//! wait: a job is either queued (up to `queue_depth`) or rejected at once.
//! At most `max_workers` jobs run concurrently.

mod config;
mod types;
mod worker;

pub use config::PoolConfig;
pub use types::{ActiveJob, PoolError, PoolStatus, RejectReason, SubmitOutcome};
pub use worker::WorkerPool;
