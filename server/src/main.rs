//! Convoy Provider binary.

use convoy_engine::CacheStore;
use convoy_server::config::Config;
use convoy_server::slack::SlackClient;
use convoy_server::{app, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "convoy_server=debug,convoy_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting Convoy provider on {}:{}", config.host, config.port);

    // One client and one cache for the whole process
    let client = SlackClient::from_config(&config)?;
    let cache = CacheStore::new(config.cache_dir.clone());
    tracing::info!(cache_dir = %config.cache_dir.display(), api_url = %config.api_url, "Provider configured");

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(Arc::new(client), cache, config);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
