//! Error types for the transformer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during the transform step.
#[derive(Debug, Error)]
pub enum TransformError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Failed to read the source duration.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// FFmpeg exited unsuccessfully.
    #[error("Transform failed: {reason}")]
    ProcessFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Transform took longer than allowed.
    #[error("Transform timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during the transform.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransformError {
    /// Creates a process failure with optional stderr output.
    pub fn process_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProcessFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Captured diagnostic output, if the tool produced any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::ProcessFailed { stderr, .. } => stderr.as_deref(),
            Self::ProbeFailed { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}
