//! Telegram Bot API client and notification sink.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Body, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::api::{ApiResponse, Update};
use super::config::TelegramConfig;
use super::error::NotifyError;
use super::traits::{DeliveryTimeouts, NotificationSink, Recipient};

/// Attempts made for a request the API keeps rate limiting.
const MAX_RATE_LIMIT_ATTEMPTS: u32 = 3;

/// `sendMessage` text limit in characters.
pub const MESSAGE_LIMIT: usize = 4096;

/// Grace added on top of the long-poll timeout.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Bot identity returned by `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotIdentity {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// Thin client over the Telegram Bot API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    read_timeout: Duration,
}

impl TelegramClient {
    /// Create a new client from configuration.
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| NotifyError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.bot_token
            ),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Send a request built by `build`, retrying while the API answers 429.
    ///
    /// The builder runs once per attempt since multipart bodies cannot be cloned.
    async fn call<T, F>(&self, method: &str, build: F) -> Result<T, NotifyError>
    where
        T: DeserializeOwned,
        F: Fn() -> Result<RequestBuilder, NotifyError>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let response = build()?.send().await?;
            let status = response.status();
            let body: ApiResponse<T> = response.json().await.map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout
                } else {
                    NotifyError::Api {
                        status: status.as_u16(),
                        description: format!("unreadable response: {}", e),
                    }
                }
            })?;

            if status.as_u16() == 429 {
                let retry_after_secs = body
                    .parameters
                    .as_ref()
                    .and_then(|p| p.retry_after)
                    .unwrap_or(1);

                if attempts >= MAX_RATE_LIMIT_ATTEMPTS {
                    warn!(
                        method,
                        attempts, retry_after_secs, "Telegram rate limit: giving up"
                    );
                    return Err(NotifyError::RateLimited { retry_after_secs });
                }

                debug!(
                    method,
                    attempt = attempts,
                    retry_after_secs,
                    "Telegram rate limited, waiting before retry"
                );
                tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
                continue;
            }

            if !status.is_success() || !body.ok {
                return Err(NotifyError::Api {
                    status: status.as_u16(),
                    description: body
                        .description
                        .unwrap_or_else(|| "no description".to_string()),
                });
            }

            return body.result.ok_or_else(|| NotifyError::Api {
                status: status.as_u16(),
                description: "response has no result".to_string(),
            });
        }
    }

    /// Fetch the bot's identity. Fails when the token is rejected.
    pub async fn get_me(&self) -> Result<BotIdentity, NotifyError> {
        let url = self.method_url("getMe");
        self.call("getMe", || {
            Ok(self.client.get(&url).timeout(self.read_timeout))
        })
        .await
    }

    /// Send a plain-text message, truncated to the API limit.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let url = self.method_url("sendMessage");
        let payload = json!({
            "chat_id": chat_id,
            "text": truncate_message(text, MESSAGE_LIMIT),
        });

        let _: serde_json::Value = self
            .call("sendMessage", || {
                Ok(self
                    .client
                    .post(&url)
                    .timeout(self.read_timeout)
                    .json(&payload))
            })
            .await?;
        Ok(())
    }

    /// Upload a video file.
    pub async fn send_video(
        &self,
        chat_id: &str,
        path: &Path,
        timeouts: &DeliveryTimeouts,
    ) -> Result<(), NotifyError> {
        let url = self.method_url("sendVideo");
        let len = tokio::fs::metadata(path).await?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        debug!(chat_id, bytes = len, file = %file_name, "Uploading video");

        // Each attempt reopens the file so retries stream from the start.
        let _: serde_json::Value = self
            .call("sendVideo", || {
                let file = std::fs::File::open(path)?;
                let stream = ReaderStream::new(tokio::fs::File::from_std(file));
                let part = multipart::Part::stream_with_length(Body::wrap_stream(stream), len)
                    .file_name(file_name.clone())
                    .mime_str("video/mp4")
                    .map_err(|e| NotifyError::Transport(e.to_string()))?;
                let form = multipart::Form::new()
                    .text("chat_id", chat_id.to_string())
                    .text("supports_streaming", "true")
                    .part("video", part);
                Ok(self
                    .client
                    .post(&url)
                    .timeout(timeouts.total())
                    .multipart(form))
            })
            .await?;
        Ok(())
    }

    /// Long-poll for updates newer than `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, NotifyError> {
        let url = self.method_url("getUpdates");
        let mut payload = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }

        let request_timeout = Duration::from_secs(timeout_secs) + POLL_GRACE;
        self.call("getUpdates", || {
            Ok(self
                .client
                .post(&url)
                .timeout(request_timeout)
                .json(&payload))
        })
        .await
    }
}

/// [`NotificationSink`] backed by the Telegram Bot API.
pub struct TelegramSink {
    client: TelegramClient,
}

impl TelegramSink {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self, NotifyError> {
        Ok(Self::new(TelegramClient::new(config)?))
    }

    /// The underlying API client.
    pub fn client(&self) -> &TelegramClient {
        &self.client
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(&self, recipient: &Recipient, text: &str) -> Result<(), NotifyError> {
        self.client.send_message(recipient.as_str(), text).await
    }

    async fn send_file(
        &self,
        recipient: &Recipient,
        path: &Path,
        timeouts: &DeliveryTimeouts,
    ) -> Result<(), NotifyError> {
        self.client
            .send_video(recipient.as_str(), path, timeouts)
            .await
    }

    async fn validate(&self) -> Result<(), NotifyError> {
        let me = self.client.get_me().await?;
        debug!(bot_id = me.id, username = ?me.username, "Telegram bot token accepted");
        Ok(())
    }
}

/// Truncate a message to fit within the character limit.
pub fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let suffix = "\n\n[truncated]";
    let budget = limit.saturating_sub(suffix.chars().count());
    let truncated: String = text.chars().take(budget).collect();
    format!("{truncated}{suffix}")
}
