//! Conversation types: declared spec, remote representation and the
//! locally tracked resource state.

use crate::{ConversationId, UnixTime, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What Delete does to the remote conversation.
///
/// This setting only exists locally; the platform never sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestroyAction {
    /// Leave the remote conversation alone.
    #[default]
    None,
    /// Archive the remote conversation.
    Archive,
}

impl DestroyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestroyAction::None => "none",
            DestroyAction::Archive => "archive",
        }
    }
}

impl fmt::Display for DestroyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown destroy action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid action_on_destroy {0:?}: expected one of \"none\", \"archive\"")]
pub struct ParseDestroyActionError(pub String);

impl FromStr for DestroyAction {
    type Err = ParseDestroyActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(DestroyAction::None),
            "archive" => Ok(DestroyAction::Archive),
            other => Err(ParseDestroyActionError(other.to_string())),
        }
    }
}

/// Desired state of a conversation, as declared by the configuration layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSpec {
    pub name: String,
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    pub action_on_destroy: DestroyAction,
}

impl ConversationSpec {
    pub fn new(name: impl Into<String>, is_private: bool) -> Self {
        Self {
            name: name.into(),
            is_private,
            topic: None,
            purpose: None,
            action_on_destroy: DestroyAction::None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn with_action_on_destroy(mut self, action: DestroyAction) -> Self {
        self.action_on_destroy = action;
        self
    }

    /// Declared topic, treating an empty string as not declared.
    pub fn declared_topic(&self) -> Option<&str> {
        self.topic.as_deref().filter(|t| !t.is_empty())
    }

    /// Declared purpose, treating an empty string as not declared.
    pub fn declared_purpose(&self) -> Option<&str> {
        self.purpose.as_deref().filter(|p| !p.is_empty())
    }
}

/// A conversation as the platform reports it.
///
/// This is also the payload stored in the response cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub is_ext_shared: bool,
    #[serde(default)]
    pub is_org_shared: bool,
    #[serde(default)]
    pub created: UnixTime,
    #[serde(default)]
    pub creator: UserId,
}

/// The locally tracked state of one managed conversation.
///
/// `id` is empty only before the first successful create. `action_on_destroy`
/// has no remote counterpart; every other field is overwritten on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    #[serde(default)]
    pub id: ConversationId,
    pub name: String,
    pub is_private: bool,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub action_on_destroy: DestroyAction,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub is_ext_shared: bool,
    #[serde(default)]
    pub is_org_shared: bool,
    #[serde(default)]
    pub created: UnixTime,
    #[serde(default)]
    pub creator: UserId,
}

impl ConversationState {
    /// State for a freshly created conversation, before it has been read back.
    pub fn declared(id: impl Into<ConversationId>, spec: &ConversationSpec) -> Self {
        Self {
            id: id.into(),
            name: spec.name.clone(),
            is_private: spec.is_private,
            topic: spec.topic.clone().unwrap_or_default(),
            purpose: spec.purpose.clone().unwrap_or_default(),
            action_on_destroy: spec.action_on_destroy,
            is_shared: false,
            is_ext_shared: false,
            is_org_shared: false,
            created: 0,
            creator: String::new(),
        }
    }

    /// State for an existing conversation known only by identifier.
    pub fn imported(id: impl Into<ConversationId>, action_on_destroy: DestroyAction) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            is_private: false,
            topic: String::new(),
            purpose: String::new(),
            action_on_destroy,
            is_shared: false,
            is_ext_shared: false,
            is_org_shared: false,
            created: 0,
            creator: String::new(),
        }
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Overwrite every remotely sourced field with the platform's view.
    ///
    /// `id` and `action_on_destroy` are left alone.
    pub fn apply_remote(&mut self, remote: &Conversation) {
        self.name = remote.name.clone();
        self.is_private = remote.is_private;
        self.topic = remote.topic.clone();
        self.purpose = remote.purpose.clone();
        self.is_shared = remote.is_shared;
        self.is_ext_shared = remote.is_ext_shared;
        self.is_org_shared = remote.is_org_shared;
        self.created = remote.created;
        self.creator = remote.creator.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn remote() -> Conversation {
        Conversation {
            id: "C123".into(),
            name: "eng-team".into(),
            is_private: true,
            topic: "deploys".into(),
            purpose: "engineering".into(),
            is_shared: false,
            is_ext_shared: true,
            is_org_shared: false,
            created: 1_706_745_600,
            creator: "U42".into(),
        }
    }

    #[test]
    fn destroy_action_parses_known_values() {
        assert_eq!("none".parse::<DestroyAction>(), Ok(DestroyAction::None));
        assert_eq!("archive".parse::<DestroyAction>(), Ok(DestroyAction::Archive));
        assert_eq!(
            "delete".parse::<DestroyAction>(),
            Err(ParseDestroyActionError("delete".into()))
        );
    }

    #[test]
    fn destroy_action_rejects_unknown_in_json() {
        let spec = serde_json::from_value::<ConversationSpec>(json!({
            "name": "eng",
            "is_private": false,
            "action_on_destroy": "delete"
        }));
        assert!(spec.is_err());
    }

    #[test]
    fn spec_requires_name_and_visibility() {
        let missing = serde_json::from_value::<ConversationSpec>(json!({
            "is_private": false,
            "action_on_destroy": "none"
        }));
        assert!(missing.is_err());

        let spec: ConversationSpec = serde_json::from_value(json!({
            "name": "eng",
            "is_private": true,
            "action_on_destroy": "archive"
        }))
        .unwrap();
        assert_eq!(spec.topic, None);
        assert_eq!(spec.action_on_destroy, DestroyAction::Archive);
    }

    #[test]
    fn empty_topic_counts_as_undeclared() {
        let spec = ConversationSpec::new("eng", false)
            .with_topic("")
            .with_purpose("ship it");
        assert_eq!(spec.declared_topic(), None);
        assert_eq!(spec.declared_purpose(), Some("ship it"));
    }

    #[test]
    fn apply_remote_keeps_local_only_fields() {
        let mut state = ConversationState::imported("C123", DestroyAction::Archive);
        state.apply_remote(&remote());

        assert_eq!(state.id, "C123");
        assert_eq!(state.action_on_destroy, DestroyAction::Archive);
        assert_eq!(state.name, "eng-team");
        assert!(state.is_private);
        assert!(state.is_ext_shared);
        assert_eq!(state.created, 1_706_745_600);
        assert_eq!(state.creator, "U42");
    }

    #[test]
    fn apply_remote_does_not_touch_id() {
        let mut state = ConversationState::imported("C123", DestroyAction::None);
        let mut other = remote();
        other.id = "C999".into();
        state.apply_remote(&other);
        assert_eq!(state.id, "C123");
    }

    #[test]
    fn conversation_tolerates_missing_optional_fields() {
        let conv: Conversation = serde_json::from_value(json!({
            "id": "C1",
            "name": "general"
        }))
        .unwrap();
        assert_eq!(conv.topic, "");
        assert!(!conv.is_private);
        assert_eq!(conv.created, 0);
    }
}
