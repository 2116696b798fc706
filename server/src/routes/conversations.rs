//! Conversation endpoint routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use convoy_engine::{ConversationSpec, ConversationState, Outcome};

use crate::auth::Orchestrator;
use crate::error::Result;
use crate::handlers::{
    handle_create, handle_delete, handle_import, handle_read, handle_update, DeleteResponse,
    ImportRequest, UpdateRequest,
};
use crate::AppState;

/// Create conversation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/conversations/create", post(create_handler))
        .route("/conversations/import", post(import_handler))
        .route("/conversations/read", post(read_handler))
        .route("/conversations/update", post(update_handler))
        .route("/conversations/delete", post(delete_handler))
}

/// POST /conversations/create - Create a conversation.
async fn create_handler(
    State(state): State<AppState>,
    _auth: Orchestrator,
    Json(spec): Json<ConversationSpec>,
) -> Result<(StatusCode, Json<Outcome>)> {
    let outcome = handle_create(&state, spec).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /conversations/import - Adopt an existing conversation.
async fn import_handler(
    State(state): State<AppState>,
    _auth: Orchestrator,
    Json(request): Json<ImportRequest>,
) -> Result<Json<Outcome>> {
    let outcome = handle_import(&state, request).await?;
    Ok(Json(outcome))
}

/// POST /conversations/read - Refresh a conversation.
async fn read_handler(
    State(state): State<AppState>,
    _auth: Orchestrator,
    Json(current): Json<ConversationState>,
) -> Result<Json<Outcome>> {
    let outcome = handle_read(&state, current).await?;
    Ok(Json(outcome))
}

/// POST /conversations/update - Converge a conversation.
async fn update_handler(
    State(state): State<AppState>,
    _auth: Orchestrator,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<Outcome>> {
    let outcome = handle_update(&state, request).await?;
    Ok(Json(outcome))
}

/// POST /conversations/delete - Apply the destroy action.
async fn delete_handler(
    State(state): State<AppState>,
    _auth: Orchestrator,
    Json(current): Json<ConversationState>,
) -> Result<Json<DeleteResponse>> {
    let response = handle_delete(&state, current).await?;
    Ok(Json(response))
}
