//! The remote client facade.
//!
//! The engine talks to the platform only through [`ConversationApi`]. The
//! provider builds one implementation per process (see `convoy-server`) and
//! lends it to every engine call; tests use [`MockApi`](crate::MockApi).

use crate::{error::ApiError, Conversation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The remote calls the engine can issue, named after the platform methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCall {
    Create,
    Info,
    Rename,
    SetTopic,
    SetPurpose,
    Archive,
}

impl RemoteCall {
    /// Web API method name for this call.
    pub fn method(&self) -> &'static str {
        match self {
            RemoteCall::Create => "conversations.create",
            RemoteCall::Info => "conversations.info",
            RemoteCall::Rename => "conversations.rename",
            RemoteCall::SetTopic => "conversations.setTopic",
            RemoteCall::SetPurpose => "conversations.setPurpose",
            RemoteCall::Archive => "conversations.archive",
        }
    }
}

impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// Read and write access to conversations on the remote platform.
///
/// Each method is one blocking round trip from the engine's point of view:
/// the engine awaits it before issuing the next call.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// Create a conversation and return its initial representation.
    async fn create(&self, name: &str, is_private: bool) -> Result<Conversation, ApiError>;

    /// Fetch the full current representation of a conversation.
    async fn info(&self, id: &str) -> Result<Conversation, ApiError>;

    async fn rename(&self, id: &str, name: &str) -> Result<(), ApiError>;

    async fn set_topic(&self, id: &str, topic: &str) -> Result<(), ApiError>;

    async fn set_purpose(&self, id: &str, purpose: &str) -> Result<(), ApiError>;

    async fn archive(&self, id: &str) -> Result<(), ApiError>;
}
