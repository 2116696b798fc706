//! Response shapes of the Slack `conversations.*` methods.

use convoy_engine::{ApiError, Conversation};
use serde::Deserialize;

/// Common envelope: `{"ok": bool, "error": "...", "channel": {...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub channel: Option<Channel>,
}

impl Envelope {
    /// Turn `ok: false` into the platform error it carries.
    pub fn into_result(self) -> Result<Option<Channel>, ApiError> {
        if self.ok {
            Ok(self.channel)
        } else {
            Err(ApiError::Platform(
                self.error.unwrap_or_else(|| "unknown_error".to_string()),
            ))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TextValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub is_ext_shared: bool,
    #[serde(default)]
    pub is_org_shared: bool,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub topic: TextValue,
    #[serde(default)]
    pub purpose: TextValue,
}

impl From<Channel> for Conversation {
    fn from(channel: Channel) -> Self {
        Conversation {
            id: channel.id,
            name: channel.name,
            is_private: channel.is_private,
            topic: channel.topic.value,
            purpose: channel.purpose.value,
            is_shared: channel.is_shared,
            is_ext_shared: channel.is_ext_shared,
            is_org_shared: channel.is_org_shared,
            created: channel.created,
            creator: channel.creator,
        }
    }
}
