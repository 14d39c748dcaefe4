// =============================================================================
// Market Board — Main Entry Point
// =============================================================================
//
// Loads reference data for the configured quote currency, polls live tickers
// for every known pair and serves the filtered board over REST + WebSocket.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod bitfinex;
mod market_data;
mod market_service;
mod pipeline;
mod runtime_config;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::ApiState;
use crate::bitfinex::BitfinexClient;
use crate::market_service::PlatformStatusSource;
use crate::pipeline::{Pipeline, PipelineSettings};
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "market_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Market Board starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_overrides(|key| std::env::var(key).ok());

    info!(
        api = %config.api_base_url,
        quote = %config.quote.code,
        poll_secs = config.poll_interval().as_secs(),
        "Configuration loaded"
    );

    // ── 2. Exchange client ───────────────────────────────────────────────
    let client = Arc::new(
        BitfinexClient::new(config.api_base_url.clone(), config.request_timeout())
            .context("building exchange client")?,
    );

    match client.fetch_platform_status().await {
        Ok(status) => info!(%status, "Exchange platform status"),
        Err(e) => warn!(error = %e, "Could not read exchange platform status"),
    }

    // ── 3. Pipeline ──────────────────────────────────────────────────────
    let pipeline = Pipeline::new(client.clone(), PipelineSettings::from_config(&config));
    pipeline.start();

    // ── 4. API server ────────────────────────────────────────────────────
    let api_state = Arc::new(ApiState::new(pipeline.clone(), client));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding API server on {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "API server listening");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, api::router(api_state)).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received, stopping");

    pipeline.shutdown();
    server.abort();

    if let Err(e) = config.save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Market Board shut down complete.");
    Ok(())
}
