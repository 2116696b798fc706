//! # Convoy Engine
//!
//! Reconciles declared Slack conversations against the live workspace.
//!
//! The crate owns three pieces:
//!
//! - a [`CacheStore`]: a directory of JSON records that are served for a fixed
//!   six-second window, keeping repeated reads under the platform's rate limits
//! - the [`ConversationApi`] trait: the remote calls the engine needs, supplied
//!   by the caller (the engine never builds a client itself)
//! - the [`Reconciler`]: the create/read/update/delete state machine
//!
//! ## Core Concepts
//!
//! ### Declared vs observed
//!
//! A [`ConversationSpec`] is what the configuration asks for. A
//! [`ConversationState`] is what the engine last saw on the platform, plus the
//! identifier and the local-only [`DestroyAction`]. Update diffs the two and
//! sends one call per changed field; every write is followed by a read-back,
//! so a state always reflects the platform rather than the request.
//!
//! ### Errors and diagnostics
//!
//! Operations return [`Diagnostics`] (warnings) on success, or an [`Error`]
//! wrapping the first failed remote call. Cache problems are never errors.
//!
//! ## Quick Start
//!
//! `MockApi` is behind the `mock` feature; production callers supply their
//! own [`ConversationApi`].
//!
//! ```rust
//! use convoy_engine::{CacheStore, ConversationSpec, DestroyAction, MockApi, Reconciler};
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let dir = tempfile::tempdir().unwrap();
//! let cache = CacheStore::new(dir.path());
//! let api = MockApi::new();
//! let engine = Reconciler::new(&api, &cache);
//!
//! let spec = ConversationSpec::new("eng-team", true)
//!     .with_topic("Deploys and incidents")
//!     .with_action_on_destroy(DestroyAction::Archive);
//!
//! let mut state = engine.create(&spec).await.unwrap().state;
//! assert!(state.is_private);
//!
//! engine.update(&mut state, &spec.clone().with_purpose("Ship it")).await.unwrap();
//! assert_eq!(state.purpose, "Ship it");
//!
//! engine.delete(&state).await.unwrap();
//! # });
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod clock;
pub mod conversation;
pub mod diagnostics;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod reconcile;

// Re-export main types at crate root
pub use api::{ConversationApi, RemoteCall};
pub use cache::{CacheError, CacheStore, FRESHNESS_WINDOW};
pub use clock::{Clock, ManualClock, SystemClock};
pub use conversation::{
    Conversation, ConversationSpec, ConversationState, DestroyAction, ParseDestroyActionError,
};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{ApiError, Error, Result};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockApi, MockCall};
pub use reconcile::{info_cache_key, Outcome, Reconciler};

/// Type aliases for clarity
pub type ConversationId = String;
pub type UserId = String;
/// Seconds since the Unix epoch, as the platform reports them.
pub type UnixTime = i64;
