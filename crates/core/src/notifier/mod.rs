//! Notifier module: the outbound messaging channel.
//!
//! Every job reports progress and its final result through one
//! [`NotificationSink`] shared by all workers. [`TelegramSink`] implements it
//! over the Telegram Bot API; the same [`TelegramClient`] also serves the
//! long-polling bot ingress.

mod api;
mod config;
mod error;
mod telegram;
mod traits;

pub use api::{Chat, IncomingUser, Message, Update};
pub use config::TelegramConfig;
pub use error::NotifyError;
pub use telegram::{truncate_message, BotIdentity, TelegramClient, TelegramSink, MESSAGE_LIMIT};
pub use traits::{DeliveryTimeouts, NotificationSink, Recipient};
