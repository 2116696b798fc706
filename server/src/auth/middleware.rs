//! Authentication middleware.
//!
//! When `AUTH_SECRET` is configured, every conversation request must carry
//! `Authorization: Bearer <secret>`. Without a secret the provider is meant to
//! listen on loopback only and accepts anonymous callers.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::AppState;

/// The caller driving reconciliation, extracted from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orchestrator {
    /// Presented the configured shared secret
    Authenticated,
    /// No secret is configured
    Anonymous,
}

impl FromRequestParts<AppState> for Orchestrator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.config.auth_secret.as_deref() else {
            return Ok(Orchestrator::Anonymous);
        };

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match auth_header.and_then(|header| header.strip_prefix("Bearer ")) {
            Some(token) if constant_time_eq(token.as_bytes(), secret.as_bytes()) => {
                Ok(Orchestrator::Authenticated)
            }
            Some(_) => {
                tracing::warn!("Rejected request with wrong bearer token");
                Err(AppError::Unauthorized)
            }
            None => Err(AppError::Unauthorized),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
