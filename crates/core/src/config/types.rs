use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::fetcher::FetcherConfig;
use crate::notifier::TelegramConfig;
use crate::pool::PoolConfig;
use crate::transformer::TransformerConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub transformer: TransformerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5000
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub telegram: SanitizedTelegramConfig,
    pub pool: PoolConfig,
    pub fetcher: FetcherConfig,
    pub transformer: TransformerConfig,
}

/// Telegram config with the bot token hidden.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub api_url: String,
    pub bot_token_configured: bool,
    pub chat_id: String,
    pub enable_polling: bool,
    pub poll_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let telegram = &config.telegram;
        Self {
            server: config.server.clone(),
            telegram: SanitizedTelegramConfig {
                api_url: telegram.api_url.clone(),
                bot_token_configured: !telegram.bot_token.is_empty(),
                chat_id: telegram.chat_id.clone(),
                enable_polling: telegram.enable_polling,
                poll_timeout_secs: telegram.poll_timeout_secs,
                connect_timeout_secs: telegram.connect_timeout_secs,
                read_timeout_secs: telegram.read_timeout_secs,
                write_timeout_secs: telegram.write_timeout_secs,
            },
            pool: config.pool.clone(),
            fetcher: config.fetcher.clone(),
            transformer: config.transformer.clone(),
        }
    }
}
