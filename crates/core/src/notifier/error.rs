//! Error types for the notifier module.

use thiserror::Error;

/// Errors raised while talking to the messaging transport.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Connection or protocol failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request exceeded its time budget.
    #[error("Request timed out")]
    Timeout,

    /// The API answered with an error.
    #[error("API error ({status}): {description}")]
    Api { status: u16, description: String },

    /// Still rate limited after the allowed number of attempts.
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Failed to read the file to upload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}
