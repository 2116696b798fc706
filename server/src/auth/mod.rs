//! Orchestrator authentication.

mod middleware;

pub use middleware::Orchestrator;
