//! Trait definitions for the notifier module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use super::error::NotifyError;

/// Chat identifier of a message recipient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(String);

impl Recipient {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Recipient {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<i64> for Recipient {
    fn from(id: i64) -> Self {
        Self::new(id.to_string())
    }
}

/// Time budgets for a file upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTimeouts {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
}

impl DeliveryTimeouts {
    /// Upper bound for the whole request.
    pub fn total(&self) -> Duration {
        self.connect + self.write + self.read
    }
}

impl Default for DeliveryTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            read: Duration::from_secs(120),
            write: Duration::from_secs(600),
        }
    }
}

/// Outbound messaging channel shared by all running jobs.
///
/// Implementations must tolerate concurrent calls.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Returns the name of this sink implementation.
    fn name(&self) -> &str;

    /// Sends a text message.
    async fn send_text(&self, recipient: &Recipient, text: &str) -> Result<(), NotifyError>;

    /// Uploads a file.
    async fn send_file(
        &self,
        recipient: &Recipient,
        path: &Path,
        timeouts: &DeliveryTimeouts,
    ) -> Result<(), NotifyError>;

    /// Checks that the transport is usable.
    async fn validate(&self) -> Result<(), NotifyError>;
}
