//! Reconciliation of declared conversations against the remote platform.
//!
//! A managed conversation moves through a small state machine:
//!
//! ```text
//! [absent]  --create-->  [present]
//! [present] --read-->    [present]   refresh every remote field
//! [present] --update-->  [present]   one call per changed field
//! [present] --delete-->  [absent]    governed by action_on_destroy
//! ```
//!
//! Writes are always two-phase: issue the mutating calls, then read the
//! conversation back from the platform and adopt that as the new state. The
//! engine never stores what it asked for as if it were what it got.
//!
//! Reads go through the [`CacheStore`]; the read-back after a write skips the
//! cache lookup (a fresh record would predate the write) but still refreshes
//! the cached record. Update evicts the record before its first call, so a
//! failure halfway through never leaves the pre-update view being served.

use crate::{
    api::{ConversationApi, RemoteCall},
    cache::CacheStore,
    error::{Error, Result},
    Conversation, ConversationSpec, ConversationState, DestroyAction, Diagnostics,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A resource state together with the warnings produced while building it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub state: ConversationState,
    pub diagnostics: Diagnostics,
}

/// Where a read may take its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// Serve a fresh cached record if there is one.
    PreferCache,
    /// Always ask the platform.
    Remote,
}

/// Cache key for the `conversations.info` response of one conversation.
pub fn info_cache_key(id: &str) -> String {
    format!("conversations.info.{id}")
}

/// Drives create/read/update/delete for conversations.
///
/// Holds no state of its own: one reconciler may serve any number of
/// conversations, and the caller guarantees at most one operation in flight
/// per conversation.
pub struct Reconciler<'a, A: ConversationApi + ?Sized> {
    api: &'a A,
    cache: &'a CacheStore,
}

impl<'a, A: ConversationApi + ?Sized> Reconciler<'a, A> {
    pub fn new(api: &'a A, cache: &'a CacheStore) -> Self {
        Self { api, cache }
    }

    /// Create the declared conversation, then read it back.
    ///
    /// On failure nothing is returned: the conversation stays absent. If the
    /// create call succeeded but the read-back failed, the error names the
    /// new identifier so it can be imported.
    pub async fn create(&self, spec: &ConversationSpec) -> Result<Outcome> {
        debug!(name = %spec.name, is_private = spec.is_private, "Creating conversation");

        let created = self
            .api
            .create(&spec.name, spec.is_private)
            .await
            .map_err(|e| Error::remote(RemoteCall::Create, &spec.name, e))?;

        let mut state = ConversationState::declared(created.id, spec);
        info!(id = %state.id, name = %spec.name, "Created conversation");

        let mut diagnostics = self.refresh(&mut state, Source::Remote).await?;

        if state.name != spec.name {
            diagnostics.warn(
                "name",
                "Conversation name was normalized",
                format!(
                    "requested {:?} but the platform created {:?}",
                    spec.name, state.name
                ),
            );
        }

        Ok(Outcome { state, diagnostics })
    }

    /// Adopt an existing conversation by identifier.
    pub async fn import(&self, id: &str, action_on_destroy: DestroyAction) -> Result<Outcome> {
        debug!(id, "Importing conversation");

        let mut state = ConversationState::imported(id, action_on_destroy);
        let diagnostics = self.refresh(&mut state, Source::Remote).await?;
        Ok(Outcome { state, diagnostics })
    }

    /// Refresh `state` from the platform, serving from cache while fresh.
    pub async fn read(&self, state: &mut ConversationState) -> Result<Diagnostics> {
        self.refresh(state, Source::PreferCache).await
    }

    /// Push the fields of `desired` that differ from `state`, then read back.
    ///
    /// Only `name`, `topic` and `purpose` are ever sent. A topic or purpose
    /// that is no longer declared is left as-is remotely. On error `state` is
    /// not modified.
    pub async fn update(
        &self,
        state: &mut ConversationState,
        desired: &ConversationSpec,
    ) -> Result<Diagnostics> {
        let id = require_id(state)?.to_string();
        debug!(id = %id, name = %desired.name, "Updating conversation");

        let mut diagnostics = Diagnostics::new();

        // A call that succeeds before a later one fails would leave a fresh
        // record describing the conversation as it was before the update.
        self.evict(&id);

        if desired.name != state.name {
            debug!(id = %id, from = %state.name, to = %desired.name, "Renaming conversation");
            self.api
                .rename(&id, &desired.name)
                .await
                .map_err(|e| Error::remote(RemoteCall::Rename, &id, e))?;
        }

        match desired.declared_topic() {
            Some(topic) if topic != state.topic => {
                self.api
                    .set_topic(&id, topic)
                    .await
                    .map_err(|e| Error::remote(RemoteCall::SetTopic, &id, e))?;
            }
            Some(_) => {}
            None if !state.topic.is_empty() => diagnostics.warn(
                "topic",
                "Topic is not cleared",
                "topic is no longer declared; the existing remote topic is kept",
            ),
            None => {}
        }

        match desired.declared_purpose() {
            Some(purpose) if purpose != state.purpose => {
                self.api
                    .set_purpose(&id, purpose)
                    .await
                    .map_err(|e| Error::remote(RemoteCall::SetPurpose, &id, e))?;
            }
            Some(_) => {}
            None if !state.purpose.is_empty() => diagnostics.warn(
                "purpose",
                "Purpose is not cleared",
                "purpose is no longer declared; the existing remote purpose is kept",
            ),
            None => {}
        }

        if desired.is_private != state.is_private {
            diagnostics.warn(
                "is_private",
                "Visibility cannot change after creation",
                format!(
                    "is_private is {} remotely; the declared value {} was not applied",
                    state.is_private, desired.is_private
                ),
            );
        }

        let mut next = state.clone();
        diagnostics.extend(self.refresh(&mut next, Source::Remote).await?);
        next.action_on_destroy = desired.action_on_destroy;
        *state = next;

        debug!(id = %id, "Finished updating conversation");
        Ok(diagnostics)
    }

    /// Apply the conversation's destroy action.
    ///
    /// With [`DestroyAction::None`] no call is made. On error the
    /// conversation must be treated as still present.
    pub async fn delete(&self, state: &ConversationState) -> Result<Diagnostics> {
        match state.action_on_destroy {
            DestroyAction::None => {
                debug!(id = %state.id, name = %state.name, "Leaving conversation untouched");
            }
            DestroyAction::Archive => {
                let id = require_id(state)?;
                debug!(id, name = %state.name, "Archiving conversation");
                self.api
                    .archive(id)
                    .await
                    .map_err(|e| Error::remote(RemoteCall::Archive, id, e))?;
                info!(id, "Archived conversation");
            }
        }
        Ok(Diagnostics::new())
    }

    fn evict(&self, id: &str) {
        if let Err(e) = self.cache.remove(&info_cache_key(id)) {
            debug!(id, error = %e, "Could not evict cached conversation");
        }
    }

    async fn refresh(&self, state: &mut ConversationState, source: Source) -> Result<Diagnostics> {
        let id = require_id(state)?;
        let key = info_cache_key(id);

        let cached = match source {
            Source::PreferCache => self.cache.get::<Conversation>(&key),
            Source::Remote => None,
        };

        let remote = match cached {
            Some(conversation) => {
                debug!(id, "Reading conversation from cache");
                conversation
            }
            None => {
                debug!(id, "Reading conversation");
                let conversation = self
                    .api
                    .info(id)
                    .await
                    .map_err(|e| Error::remote(RemoteCall::Info, id, e))?;
                if let Err(e) = self.cache.put(&key, &conversation) {
                    debug!(id, error = %e, "Could not cache conversation");
                }
                conversation
            }
        };

        state.apply_remote(&remote);
        debug!(id = %state.id, name = %state.name, "Finished reading conversation");
        Ok(Diagnostics::new())
    }
}

fn require_id(state: &ConversationState) -> Result<&str> {
    if state.has_id() {
        Ok(&state.id)
    } else {
        Err(Error::MissingId)
    }
}
