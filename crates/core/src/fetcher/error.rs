//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Fetch tool binary not found.
    #[error("Fetch tool not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// Fetch tool exited unsuccessfully.
    #[error("Fetch failed: {reason}")]
    ProcessFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Fetch took longer than allowed.
    #[error("Fetch timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while fetching.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Creates a process failure with optional stderr output.
    pub fn process_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProcessFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Captured diagnostic output, if the tool produced any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::ProcessFailed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}
