//! In-memory stand-in for the remote platform.
//!
//! Records every call and lets tests inject failures per call kind, making it
//! easy to assert exactly which remote traffic an operation produced.

use crate::{
    api::{ConversationApi, RemoteCall},
    error::ApiError,
    Conversation, ConversationId,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// One call received by [`MockApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Create { name: String, is_private: bool },
    Info(ConversationId),
    Rename(ConversationId, String),
    SetTopic(ConversationId, String),
    SetPurpose(ConversationId, String),
    Archive(ConversationId),
}

impl MockCall {
    pub fn kind(&self) -> RemoteCall {
        match self {
            MockCall::Create { .. } => RemoteCall::Create,
            MockCall::Info(_) => RemoteCall::Info,
            MockCall::Rename(..) => RemoteCall::Rename,
            MockCall::SetTopic(..) => RemoteCall::SetTopic,
            MockCall::SetPurpose(..) => RemoteCall::SetPurpose,
            MockCall::Archive(_) => RemoteCall::Archive,
        }
    }
}

#[derive(Debug)]
struct MockState {
    conversations: BTreeMap<ConversationId, Conversation>,
    archived: Vec<ConversationId>,
    calls: Vec<MockCall>,
    failures: HashMap<RemoteCall, ApiError>,
    next_id: u64,
    creator: String,
    now: i64,
}

/// A fake workspace holding conversations in memory.
///
/// Created conversations get identifiers `C<n>` counting up from the seed,
/// names are normalised the way the platform does (lowercase, spaces to
/// dashes) and duplicate names are refused with `name_taken`.
#[derive(Debug)]
pub struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::with_id_seed(1)
    }

    /// Start identifier allocation at `C<seed>`.
    pub fn with_id_seed(seed: u64) -> Self {
        Self {
            state: Mutex::new(MockState {
                conversations: BTreeMap::new(),
                archived: Vec::new(),
                calls: Vec::new(),
                failures: HashMap::new(),
                next_id: seed,
                creator: "U0001".to_string(),
                now: 1_706_745_600,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a conversation that already exists remotely.
    pub fn insert(&self, conversation: Conversation) {
        self.lock()
            .conversations
            .insert(conversation.id.clone(), conversation);
    }

    /// Make every subsequent call of `kind` fail with `error`.
    pub fn fail_on(&self, kind: RemoteCall, error: ApiError) {
        self.lock().failures.insert(kind, error);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Calls of one kind received so far.
    pub fn calls_of(&self, kind: RemoteCall) -> Vec<MockCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Current remote view of a conversation.
    pub fn conversation(&self, id: &str) -> Option<Conversation> {
        self.lock().conversations.get(id).cloned()
    }

    pub fn is_archived(&self, id: &str) -> bool {
        self.lock().archived.iter().any(|a| a == id)
    }

    /// Record `call`, then return the injected failure for its kind, if any.
    fn record(&self, call: MockCall) -> Result<MutexGuard<'_, MockState>, ApiError> {
        let mut state = self.lock();
        let kind = call.kind();
        state.calls.push(call);
        if let Some(error) = state.failures.get(&kind).cloned() {
            return Err(error);
        }
        Ok(state)
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

fn name_taken(state: &MockState, name: &str, except: Option<&str>) -> bool {
    state
        .conversations
        .values()
        .any(|c| c.name == name && Some(c.id.as_str()) != except)
}

fn lookup<'a>(state: &'a mut MockState, id: &str) -> Result<&'a mut Conversation, ApiError> {
    state
        .conversations
        .get_mut(id)
        .ok_or_else(|| ApiError::Platform("channel_not_found".to_string()))
}

#[async_trait]
impl ConversationApi for MockApi {
    async fn create(&self, name: &str, is_private: bool) -> Result<Conversation, ApiError> {
        let mut state = self.record(MockCall::Create {
            name: name.to_string(),
            is_private,
        })?;

        let name = normalize_name(name);
        if name.is_empty() {
            return Err(ApiError::Platform("invalid_name_required".to_string()));
        }
        if name_taken(&state, &name, None) {
            return Err(ApiError::Platform("name_taken".to_string()));
        }

        let id = format!("C{}", state.next_id);
        state.next_id += 1;
        let conversation = Conversation {
            id: id.clone(),
            name,
            is_private,
            topic: String::new(),
            purpose: String::new(),
            is_shared: false,
            is_ext_shared: false,
            is_org_shared: false,
            created: state.now,
            creator: state.creator.clone(),
        };
        state.conversations.insert(id, conversation.clone());
        Ok(conversation)
    }

    async fn info(&self, id: &str) -> Result<Conversation, ApiError> {
        let mut state = self.record(MockCall::Info(id.to_string()))?;
        let conversation = lookup(&mut state, id)?.clone();
        Ok(conversation)
    }

    async fn rename(&self, id: &str, name: &str) -> Result<(), ApiError> {
        let mut state = self.record(MockCall::Rename(id.to_string(), name.to_string()))?;
        let name = normalize_name(name);
        if name_taken(&state, &name, Some(id)) {
            return Err(ApiError::Platform("name_taken".to_string()));
        }
        lookup(&mut state, id)?.name = name;
        Ok(())
    }

    async fn set_topic(&self, id: &str, topic: &str) -> Result<(), ApiError> {
        let mut state = self.record(MockCall::SetTopic(id.to_string(), topic.to_string()))?;
        lookup(&mut state, id)?.topic = topic.to_string();
        Ok(())
    }

    async fn set_purpose(&self, id: &str, purpose: &str) -> Result<(), ApiError> {
        let mut state = self.record(MockCall::SetPurpose(id.to_string(), purpose.to_string()))?;
        lookup(&mut state, id)?.purpose = purpose.to_string();
        Ok(())
    }

    async fn archive(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.record(MockCall::Archive(id.to_string()))?;
        lookup(&mut state, id)?;
        if state.archived.iter().any(|a| a == id) {
            return Err(ApiError::Platform("already_archived".to_string()));
        }
        state.archived.push(id.to_string());
        Ok(())
    }
}
