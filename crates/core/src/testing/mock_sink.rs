//! Mock notification sink for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notifier::{DeliveryTimeouts, NotificationSink, NotifyError, Recipient};

/// A message the sink was asked to send.
#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    Text {
        recipient: Recipient,
        text: String,
    },
    File {
        recipient: Recipient,
        path: PathBuf,
        /// File size at send time.
        size: u64,
        timeouts: DeliveryTimeouts,
    },
}

impl SentMessage {
    pub fn recipient(&self) -> &Recipient {
        match self {
            Self::Text { recipient, .. } | Self::File { recipient, .. } => recipient,
        }
    }
}

/// Mock implementation of the NotificationSink trait.
///
/// Only successful sends are recorded; failed attempts are counted
/// separately.
#[derive(Debug, Default)]
pub struct MockSink {
    sent: Arc<RwLock<Vec<SentMessage>>>,
    failed_attempts: Arc<RwLock<usize>>,
    fail_text: AtomicBool,
    fail_files: AtomicBool,
    fail_validate: AtomicBool,
    panic_text: AtomicBool,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every text send fail.
    pub fn set_fail_text(&self, fail: bool) {
        self.fail_text.store(fail, Ordering::SeqCst);
    }

    /// Make every file send fail.
    pub fn set_fail_files(&self, fail: bool) {
        self.fail_files.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_validate(&self, fail: bool) {
        self.fail_validate.store(fail, Ordering::SeqCst);
    }

    /// Make every text send panic.
    pub fn set_panic_text(&self, panic: bool) {
        self.panic_text.store(panic, Ordering::SeqCst);
    }

    /// Everything delivered, in order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    /// Delivered texts, in order.
    pub async fn texts(&self) -> Vec<String> {
        self.sent
            .read()
            .await
            .iter()
            .filter_map(|m| match m {
                SentMessage::Text { text, .. } => Some(text.clone()),
                SentMessage::File { .. } => None,
            })
            .collect()
    }

    /// Delivered files as (path, size).
    pub async fn files(&self) -> Vec<(PathBuf, u64)> {
        self.sent
            .read()
            .await
            .iter()
            .filter_map(|m| match m {
                SentMessage::File { path, size, .. } => Some((path.clone(), *size)),
                SentMessage::Text { .. } => None,
            })
            .collect()
    }

    pub async fn failed_attempts(&self) -> usize {
        *self.failed_attempts.read().await
    }

    async fn refuse(&self, what: &str) -> NotifyError {
        *self.failed_attempts.write().await += 1;
        NotifyError::Transport(format!("mock {} failure", what))
    }
}

#[async_trait]
impl NotificationSink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_text(&self, recipient: &Recipient, text: &str) -> Result<(), NotifyError> {
        if self.panic_text.load(Ordering::SeqCst) {
            panic!("mock sink panic");
        }
        if self.fail_text.load(Ordering::SeqCst) {
            return Err(self.refuse("text").await);
        }
        self.sent.write().await.push(SentMessage::Text {
            recipient: recipient.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_file(
        &self,
        recipient: &Recipient,
        path: &Path,
        timeouts: &DeliveryTimeouts,
    ) -> Result<(), NotifyError> {
        if self.fail_files.load(Ordering::SeqCst) {
            return Err(self.refuse("upload").await);
        }
        let size = tokio::fs::metadata(path).await?.len();
        self.sent.write().await.push(SentMessage::File {
            recipient: recipient.clone(),
            path: path.to_path_buf(),
            size,
            timeouts: *timeouts,
        });
        Ok(())
    }

    async fn validate(&self) -> Result<(), NotifyError> {
        if self.fail_validate.load(Ordering::SeqCst) {
            return Err(NotifyError::Api {
                status: 401,
                description: "Unauthorized".to_string(),
            });
        }
        Ok(())
    }
}
