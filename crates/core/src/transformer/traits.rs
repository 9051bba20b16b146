//! Trait definitions for the transformer module.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::error::TransformError;

/// What a successful transform produced.
#[derive(Debug, Clone, Serialize)]
pub struct TransformReport {
    pub output_path: PathBuf,
    /// Probed duration of the input.
    pub source_duration_secs: f64,
    /// Duration passed to the encoder after trimming.
    pub output_duration_secs: f64,
    /// Wall-clock time spent transforming.
    pub duration_ms: u64,
}

/// Runs the filter/encode step on a local media file.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Returns the name of this transformer implementation.
    fn name(&self) -> &str;

    /// Transforms `input` into `output`.
    async fn transform(&self, input: &Path, output: &Path)
        -> Result<TransformReport, TransformError>;

    /// Validates that the transformer is properly configured and ready.
    async fn validate(&self) -> Result<(), TransformError>;
}
