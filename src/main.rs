// =============================================================================
// Stock Analyzer — Main Entry Point
// =============================================================================
//
// Serves the dashboard backend: dataset loading, chart data and technical
// analysis over a single in-memory dataset.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use stock_analyzer::app_state::AppState;
use stock_analyzer::runtime_config::AnalyzerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("ANALYZER_CONFIG").unwrap_or_else(|_| "analyzer_config.json".into());
    let config_result = AnalyzerConfig::load(&config_path);
    let default_level = match &config_result {
        Ok(cfg) if cfg.debug => "debug",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = config_result.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AnalyzerConfig::default()
    });

    if let Ok(addr) = std::env::var("ANALYZER_BIND_ADDR") {
        config.bind_addr = addr;
    }
    if let Ok(url) = std::env::var("ANALYZER_PROVIDER_URL") {
        config.provider_base_url = url;
    }

    info!(
        debug = config.debug,
        provider = %config.provider_base_url,
        "Stock Analyzer starting"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config)?);

    // ── 3. Start the API server ──────────────────────────────────────────
    let app = stock_analyzer::api::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    // ── 4. Graceful shutdown ─────────────────────────────────────────────
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        warn!("Shutdown signal received, stopping gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Stock Analyzer shut down complete.");
    Ok(())
}
