//! HTTP client for the Slack `conversations.*` methods.

use super::wire::{Channel, Envelope};
use crate::config::Config;
use async_trait::async_trait;
use convoy_engine::{ApiError, Conversation, ConversationApi, RemoteCall};
use reqwest::{header::RETRY_AFTER, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Authenticated Slack Web API client.
///
/// Built once per process from a single token and shared by every request.
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("convoy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.slack_token.clone(),
            config.api_url.clone(),
            config.request_timeout,
        )
    }

    async fn call(
        &self,
        call: RemoteCall,
        params: &[(&str, &str)],
    ) -> Result<Option<Channel>, ApiError> {
        let url = format!("{}/{}", self.base_url, call.method());
        debug!(method = call.method(), "Calling Slack");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .form(params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok());
            return Err(ApiError::RateLimited { retry_after });
        }
        if !status.is_success() {
            return Err(ApiError::Transport(format!("unexpected HTTP status {status}")));
        }

        let envelope: Envelope = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::InvalidResponse(e.to_string())
            }
        })?;
        envelope.into_result()
    }

    async fn call_for_channel(
        &self,
        call: RemoteCall,
        params: &[(&str, &str)],
    ) -> Result<Conversation, ApiError> {
        self.call(call, params)
            .await?
            .map(Conversation::from)
            .ok_or_else(|| ApiError::InvalidResponse(format!("{call} returned no channel")))
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(e.to_string())
    }
}

#[async_trait]
impl ConversationApi for SlackClient {
    async fn create(&self, name: &str, is_private: bool) -> Result<Conversation, ApiError> {
        let is_private = if is_private { "true" } else { "false" };
        self.call_for_channel(
            RemoteCall::Create,
            &[("name", name), ("is_private", is_private)],
        )
        .await
    }

    async fn info(&self, id: &str) -> Result<Conversation, ApiError> {
        self.call_for_channel(RemoteCall::Info, &[("channel", id)])
            .await
    }

    async fn rename(&self, id: &str, name: &str) -> Result<(), ApiError> {
        self.call(RemoteCall::Rename, &[("channel", id), ("name", name)])
            .await
            .map(drop)
    }

    async fn set_topic(&self, id: &str, topic: &str) -> Result<(), ApiError> {
        self.call(RemoteCall::SetTopic, &[("channel", id), ("topic", topic)])
            .await
            .map(drop)
    }

    async fn set_purpose(&self, id: &str, purpose: &str) -> Result<(), ApiError> {
        self.call(
            RemoteCall::SetPurpose,
            &[("channel", id), ("purpose", purpose)],
        )
        .await
        .map(drop)
    }

    async fn archive(&self, id: &str) -> Result<(), ApiError> {
        self.call(RemoteCall::Archive, &[("channel", id)])
            .await
            .map(drop)
    }
}
