//! Error types for the Convoy engine.

use crate::api::RemoteCall;
use thiserror::Error;

/// Failures reported by a [`ConversationApi`](crate::ConversationApi) implementation.
///
/// The engine never retries these; they are wrapped in [`Error::Remote`] and
/// returned to the caller with their message intact.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The platform answered but refused the call (e.g. `channel_not_found`).
    #[error("{0}")]
    Platform(String),

    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// All errors the reconciliation engine can return.
///
/// Cache failures never appear here: they degrade to a remote call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A remote call failed. `target` is the conversation identifier, or the
    /// requested name for a create call.
    #[error("{call} ({target}): {source}")]
    Remote {
        call: RemoteCall,
        target: String,
        #[source]
        source: ApiError,
    },

    #[error("conversation has no identifier; create or import it first")]
    MissingId,
}

impl Error {
    pub(crate) fn remote(call: RemoteCall, target: impl Into<String>, source: ApiError) -> Self {
        Error::Remote {
            call,
            target: target.into(),
            source,
        }
    }

    /// The underlying platform error, if this is a remote failure.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Remote { source, .. } => Some(source),
            Error::MissingId => None,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
