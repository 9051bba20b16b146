//! Long-polling loop for chat updates.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::notifier::Update;

use super::ingress::{BotIngress, IncomingMessage};
use super::transport::BotTransport;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Feeds chat updates to a [`BotIngress`] and sends its replies.
pub struct BotPoller {
    transport: Arc<dyn BotTransport>,
    ingress: BotIngress,
    poll_timeout_secs: u64,
    backoff: Duration,
}

impl BotPoller {
    pub fn new(transport: Arc<dyn BotTransport>, ingress: BotIngress, poll_timeout_secs: u64) -> Self {
        Self {
            transport,
            ingress,
            poll_timeout_secs,
            backoff: Duration::from_secs(1),
        }
    }

    /// Base delay after a failed poll; doubles per consecutive failure.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Polls until a shutdown signal arrives.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(timeout_secs = self.poll_timeout_secs, "Bot polling started");

        let mut offset: Option<i64> = None;
        let mut failures: u32 = 0;

        loop {
            let result = tokio::select! {
                _ = shutdown.recv() => break,
                result = self.transport.fetch_updates(offset, self.poll_timeout_secs) => result,
            };

            match result {
                Ok(updates) => {
                    failures = 0;
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        self.dispatch(&update).await;
                    }
                }
                Err(e) => {
                    failures += 1;
                    let delay = backoff_delay(self.backoff, failures);
                    warn!(error = %e, failures, delay_ms = delay.as_millis() as u64, "Polling for updates failed");
                    tokio::select! {
                        _ = shutdown.recv() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!("Bot polling stopped");
    }

    async fn dispatch(&self, update: &Update) {
        let Some(message) = IncomingMessage::from_update(update) else {
            debug!(update_id = update.update_id, "Skipping update without text");
            return;
        };

        if let Some(reply) = self.ingress.handle(&message) {
            if let Err(e) = self.transport.reply(message.chat_id, &reply).await {
                warn!(chat_id = message.chat_id, error = %e, "Failed to reply to chat");
            }
        }
    }
}

fn backoff_delay(base: Duration, failures: u32) -> Duration {
    let factor = 1u32 << failures.saturating_sub(1).min(6);
    (base * factor).min(MAX_BACKOFF)
}
