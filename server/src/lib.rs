//! Convoy Provider - serves conversation reconciliation to an orchestrator.
//!
//! The provider owns everything the engine treats as external: configuration,
//! the authenticated Slack client and the response cache. Each HTTP request
//! runs exactly one engine operation for one conversation.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod slack;

use crate::config::Config;
use axum::Router;
use convoy_engine::{CacheStore, ConversationApi};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn ConversationApi>,
    pub cache: Arc<CacheStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(api: Arc<dyn ConversationApi>, cache: CacheStore, config: Config) -> Self {
        Self {
            api,
            cache: Arc::new(cache),
            config: Arc::new(config),
        }
    }
}

/// Build the router with all routes and middleware.
///
/// No CORS layer: the only client is the orchestrator, and browsers must not
/// be able to drive the provider's token from another origin.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
