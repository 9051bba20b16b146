//! Configuration for the Telegram transport.

use serde::{Deserialize, Serialize};

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token.
    pub bot_token: String,
    /// The single recipient of progress and results (numeric id or `@username`).
    pub chat_id: String,
    /// Bot API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Whether to long-poll for incoming chat messages.
    #[serde(default = "default_enable_polling")]
    pub enable_polling: bool,
    /// Long-poll timeout for `getUpdates` in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Connect budget for every request.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Budget for reading a response.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Budget for writing a request body (file uploads).
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_enable_polling() -> bool {
    true
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_read_timeout() -> u64 {
    120
}

fn default_write_timeout() -> u64 {
    600 // 10 minutes for uploads
}

impl TelegramConfig {
    /// Creates a config for the given bot and recipient with default timeouts.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_url: default_api_url(),
            enable_polling: default_enable_polling(),
            poll_timeout_secs: default_poll_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            write_timeout_secs: default_write_timeout(),
        }
    }

    /// Points the client at a different Bot API server.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Enables or disables long polling.
    pub fn with_polling(mut self, enabled: bool) -> Self {
        self.enable_polling = enabled;
        self
    }
}
