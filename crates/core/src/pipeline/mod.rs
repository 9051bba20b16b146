//! Pipeline module: runs one job through fetch, transform and deliver.
//!
//! [`PipelineRunner::run_job`] never fails. Every error raised once a job
//! exists is classified into a [`FailureReason`](crate::job::FailureReason),
//! reported to the recipient exactly once, and absorbed. Intermediate
//! artifacts live in an [`ArtifactWorkspace`] that is emptied on every exit
//! path, including panics and cancellation.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelbot_core::pipeline::{PipelineConfig, PipelineRunner};
//!
//! let runner = PipelineRunner::new(config, fetcher, transformer, sink, recipient);
//! let report = runner.run_job(job).await;
//! assert!(report.succeeded());
//! ```

mod config;
mod messages;
mod runner;
mod workspace;

pub use config::PipelineConfig;
pub use messages::{failure_message, started_message, TRANSFORM_EXCERPT_LINES};
pub use runner::{PipelineRunner, UpdateCallback};
pub use workspace::ArtifactWorkspace;
