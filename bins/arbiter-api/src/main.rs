mod handlers;
mod routes;

use anyhow::{Context, Result};
use arbiter_common::config::HarnessConfig;
use arbiter_harness::{Harness, Judge0Client};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub struct AppState {
    pub harness: Harness<Judge0Client>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Arbiter API booting...");

    let config = HarnessConfig::from_env().context("Invalid harness configuration")?;
    if config.api_key.is_none() {
        warn!("JUDGE0_API_KEY is not set; /execute will be rejected and /grade will simulate");
    }
    info!(
        api_url = %config.api_url,
        poll_interval_ms = config.poll.interval.as_millis() as u64,
        max_poll_attempts = config.poll.max_attempts,
        "Execution backend configured"
    );

    let harness = Harness::from_config(&config).context("Failed to build execution harness")?;
    info!(languages = ?harness.languages().list_languages(), "Language table loaded");

    let state = Arc::new(AppState { harness });

    let app = Router::new().merge(routes::routes()).with_state(state);

    let addr = std::env::var("ARBITER_API_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
