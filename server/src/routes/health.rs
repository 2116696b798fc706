//! Liveness and cache status.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` while the cache cannot be written
    pub status: &'static str,
    pub version: &'static str,
    pub cache: CacheHealth,
}

#[derive(Serialize)]
pub struct CacheHealth {
    pub root: String,
    pub writable: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

/// Always 200: an unwritable cache only costs extra Slack reads.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let writable = match state.cache.check_writable() {
        Ok(()) => true,
        Err(e) => {
            warn!(root = %state.cache.root().display(), error = %e, "Cache is not writable");
            false
        }
    };

    Json(HealthResponse {
        status: if writable { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        cache: CacheHealth {
            root: state.cache.root().display().to_string(),
            writable,
        },
    })
}

async fn root() -> &'static str {
    "Convoy Conversation Provider"
}
