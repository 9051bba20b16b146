//! Bot module: conversational ingress over the Telegram Bot API.
//!
//! [`BotIngress`] turns chat messages into jobs on the shared pool.
//! [`BotPoller`] long-polls for messages and answers in the sender's chat.

mod ingress;
mod poller;
mod transport;

pub use ingress::{BotIngress, IncomingMessage, ACCEPTED_REPLY, GREETING, INVALID_URL_REPLY};
pub use poller::BotPoller;
pub use transport::BotTransport;
