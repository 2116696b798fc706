//! Conversation handlers - run one engine operation per request.
//!
//! The orchestrator owns resource state: it sends the last known state with
//! each request and stores whatever state comes back.

use crate::error::{AppError, Result};
use crate::AppState;
use convoy_engine::{
    ConversationSpec, ConversationState, DestroyAction, Diagnostics, Outcome, Reconciler,
};
use serde::{Deserialize, Serialize};

/// Request body for import.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Identifier of an existing conversation
    pub id: String,
    #[serde(default)]
    pub action_on_destroy: DestroyAction,
}

/// Request body for update.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    /// Last known state
    pub state: ConversationState,
    /// Desired configuration
    pub desired: ConversationSpec,
}

/// Response for delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub diagnostics: Diagnostics,
}

/// Create a conversation from its declared configuration.
pub async fn handle_create(state: &AppState, spec: ConversationSpec) -> Result<Outcome> {
    if spec.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    let engine = Reconciler::new(state.api.as_ref(), &state.cache);
    Ok(engine.create(&spec).await?)
}

/// Adopt an existing conversation.
pub async fn handle_import(state: &AppState, request: ImportRequest) -> Result<Outcome> {
    if request.id.is_empty() {
        return Err(AppError::BadRequest("id must not be empty".to_string()));
    }
    let engine = Reconciler::new(state.api.as_ref(), &state.cache);
    Ok(engine.import(&request.id, request.action_on_destroy).await?)
}

/// Refresh a conversation's state.
pub async fn handle_read(state: &AppState, mut current: ConversationState) -> Result<Outcome> {
    let engine = Reconciler::new(state.api.as_ref(), &state.cache);
    let diagnostics = engine.read(&mut current).await?;
    Ok(Outcome {
        state: current,
        diagnostics,
    })
}

/// Converge a conversation onto its desired configuration.
pub async fn handle_update(state: &AppState, request: UpdateRequest) -> Result<Outcome> {
    let UpdateRequest {
        state: mut current,
        desired,
    } = request;
    let engine = Reconciler::new(state.api.as_ref(), &state.cache);
    let diagnostics = engine.update(&mut current, &desired).await?;
    Ok(Outcome {
        state: current,
        diagnostics,
    })
}

/// Apply a conversation's destroy action.
pub async fn handle_delete(state: &AppState, current: ConversationState) -> Result<DeleteResponse> {
    let engine = Reconciler::new(state.api.as_ref(), &state.cache);
    let diagnostics = engine.delete(&current).await?;
    Ok(DeleteResponse { diagnostics })
}
