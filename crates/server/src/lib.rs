//! HTTP ingress and process wiring for ReelBot.

pub mod api;
pub mod metrics;
pub mod state;
