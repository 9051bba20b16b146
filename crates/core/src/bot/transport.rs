//! Transport seam for the bot poller.

use async_trait::async_trait;

use crate::notifier::{NotifyError, TelegramClient, Update};

/// Source of chat updates and channel for replies.
#[async_trait]
pub trait BotTransport: Send + Sync {
    /// Long-polls for updates with id `>= offset`.
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, NotifyError>;

    /// Answers in a chat.
    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), NotifyError>;
}

#[async_trait]
impl BotTransport for TelegramClient {
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, NotifyError> {
        self.get_updates(offset, timeout_secs).await
    }

    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        self.send_message(&chat_id.to_string(), text).await
    }
}
