//! Slack Web API client implementing the engine's remote facade.

mod client;
mod wire;

pub use client::SlackClient;
