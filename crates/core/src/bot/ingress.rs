//! Chat message handling.

use std::sync::Arc;

use tracing::{debug, info};

use crate::job::{validate_source_url, Job, JobOrigin};
use crate::notifier::Update;
use crate::pool::{SubmitOutcome, WorkerPool};

pub const GREETING: &str =
    "👋 Welcome to ReelBot!\nSend a video URL to process, or use the API.";

pub const INVALID_URL_REPLY: &str =
    "Please send a valid URL starting with http:// or https://.";

pub const ACCEPTED_REPLY: &str = "Got it! Your request is being queued for processing... ⏳";

/// A text message received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub user_id: i64,
    pub text: String,
}

impl IncomingMessage {
    pub fn new(chat_id: i64, user_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            user_id,
            text: text.into(),
        }
    }

    /// Extracts a text message from a human sender, if the update has one.
    pub fn from_update(update: &Update) -> Option<Self> {
        let message = update.message.as_ref()?;
        let text = message.text.as_ref()?;
        let user_id = match &message.from {
            Some(user) if user.is_bot => return None,
            Some(user) => user.id,
            None => message.chat.id,
        };
        Some(Self::new(message.chat.id, user_id, text.clone()))
    }
}

/// Validates chat messages and submits them to the pool.
#[derive(Clone)]
pub struct BotIngress {
    pool: Arc<WorkerPool>,
}

impl BotIngress {
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self { pool }
    }

    /// Handles one message and returns the reply to send, if any.
    pub fn handle(&self, message: &IncomingMessage) -> Option<String> {
        let text = message.text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(command) = text.strip_prefix('/') {
            let name = command
                .split_whitespace()
                .next()
                .and_then(|c| c.split('@').next())
                .unwrap_or_default();
            return match name {
                "start" => Some(GREETING.to_string()),
                _ => {
                    debug!(user_id = message.user_id, command = name, "Ignoring command");
                    None
                }
            };
        }

        let url = match validate_source_url(text) {
            Ok(url) => url,
            Err(e) => {
                debug!(user_id = message.user_id, error = %e, "Rejected chat message");
                return Some(INVALID_URL_REPLY.to_string());
            }
        };

        let job = Job::new(
            url,
            JobOrigin::Bot {
                user_id: message.user_id,
            },
        );
        match self.pool.submit(job) {
            SubmitOutcome::Accepted(job_id) => {
                info!(job_id = %job_id, user_id = message.user_id, "Accepted bot request");
                Some(ACCEPTED_REPLY.to_string())
            }
            SubmitOutcome::Rejected(reason) => Some(format!("Sorry, {}.", reason)),
        }
    }
}
