//! Mock transformer for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transformer::{TransformError, TransformReport, Transformer};

use super::gauge::{ConcurrencyGauge, Gate};

/// What the mock does when asked to transform.
#[derive(Debug, Clone)]
pub enum TransformBehavior {
    /// Copy the input to the output.
    Copy,
    /// Create an empty output file and report success.
    WriteEmpty,
    /// Fail with the given stderr.
    Fail { stderr: String },
}

impl Default for TransformBehavior {
    fn default() -> Self {
        Self::Copy
    }
}

/// A recorded transform call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTransform {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Size of the input when the call started.
    pub input_size: u64,
}

/// Mock implementation of the Transformer trait.
#[derive(Debug)]
pub struct MockTransformer {
    behavior: Arc<RwLock<TransformBehavior>>,
    calls: Arc<RwLock<Vec<RecordedTransform>>>,
    source_duration_secs: f64,
    trim_secs: f64,
    gate: Gate,
    gauge: Arc<ConcurrencyGauge>,
}

impl Default for MockTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransformer {
    /// Create a new mock transformer that copies its input.
    pub fn new() -> Self {
        Self {
            behavior: Arc::new(RwLock::new(TransformBehavior::default())),
            calls: Arc::new(RwLock::new(Vec::new())),
            source_duration_secs: 10.0,
            trim_secs: 0.1,
            gate: Gate::opened(),
            gauge: ConcurrencyGauge::new(),
        }
    }

    /// Share a gauge with other collaborators.
    pub fn with_gauge(mut self, gauge: Arc<ConcurrencyGauge>) -> Self {
        self.gauge = gauge;
        self
    }

    /// Duration reported for every input.
    pub fn with_source_duration(mut self, secs: f64) -> Self {
        self.source_duration_secs = secs;
        self
    }

    pub async fn set_behavior(&self, behavior: TransformBehavior) {
        *self.behavior.write().await = behavior;
    }

    pub fn hold(&self) {
        self.gate.close();
    }

    pub fn release(&self) {
        self.gate.open();
    }

    pub fn gauge(&self) -> &Arc<ConcurrencyGauge> {
        &self.gauge
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedTransform> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl Transformer for MockTransformer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transform(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<TransformReport, TransformError> {
        let _guard = self.gauge.enter();

        let input_size = tokio::fs::metadata(input)
            .await
            .map_err(|_| TransformError::InputNotFound {
                path: input.to_path_buf(),
            })?
            .len();
        self.calls.write().await.push(RecordedTransform {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            input_size,
        });

        self.gate.pass().await;

        let behavior = self.behavior.read().await.clone();
        match behavior {
            TransformBehavior::Copy => {
                tokio::fs::copy(input, output).await?;
            }
            TransformBehavior::WriteEmpty => tokio::fs::write(output, b"").await?,
            TransformBehavior::Fail { stderr } => {
                return Err(TransformError::process_failed(
                    "ffmpeg exited with code 1",
                    Some(stderr),
                ));
            }
        }

        Ok(TransformReport {
            output_path: output.to_path_buf(),
            source_duration_secs: self.source_duration_secs,
            output_duration_secs: crate::transformer::trim_target(
                self.source_duration_secs,
                self.trim_secs,
            ),
            duration_ms: 0,
        })
    }

    async fn validate(&self) -> Result<(), TransformError> {
        Ok(())
    }
}
