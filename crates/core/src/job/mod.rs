//! Job model for the fetch → transform → deliver pipeline.
//!
//! A [`Job`] is created by an ingress adapter once the submitted URL passed
//! [`validate_source_url`], then owned by exactly one pipeline task until it
//! reaches a terminal state. Its id names the temporary artifacts, so two
//! jobs never touch the same files.

mod types;
mod validation;

pub use types::{
    ErrorKind, FailureReason, Job, JobId, JobOrigin, JobReport, JobState, JobTimings,
    StageTiming, TransitionError,
};
pub use validation::{diagnostic_excerpt, validate_source_url, InvalidUrl};
