// =============================================================================
// Coin Scout — Main Entry Point
// =============================================================================
//
// Polls the listings snapshot on a fixed interval and classifies every asset
// into hot / sell / buy / ditch lists.  Cycles never overlap: the next tick is
// only awaited once the previous cycle has persisted its state.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod classifier;
mod engine;
mod history;
mod indicators;
mod persistence;
mod provider;
mod ranking;
mod runtime_config;
mod snapshot;
mod types;

use std::path::Path;
use std::sync::Arc;

use tokio::time::{Duration, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::engine::Engine;
use crate::persistence::JsonFileStore;
use crate::provider::{CoinMarketCapClient, FileSnapshotProvider, SnapshotProvider};
use crate::runtime_config::RuntimeConfig;
use crate::types::ClassificationResult;

const DEFAULT_CONFIG_PATH: &str = "coin_scout.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Coin Scout — Starting Up                          ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path =
        std::env::var("COIN_SCOUT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        let config = RuntimeConfig::default();
        if !Path::new(&config_path).exists() {
            if let Err(e) = config.save(&config_path) {
                warn!(error = %e, "Failed to write config template");
            }
        }
        config
    });

    if let Ok(addr) = std::env::var("COIN_SCOUT_BIND_ADDR") {
        config.bind_addr = addr;
    }

    info!(
        limit = config.listing_limit,
        convert = %config.convert,
        interval_secs = config.poll_interval_secs,
        "Configuration ready"
    );

    // ── 2. Snapshot provider ─────────────────────────────────────────────
    let provider: Arc<dyn SnapshotProvider> = match std::env::var("COIN_SCOUT_REPLAY_FILE") {
        Ok(path) => {
            info!(path = %path, "Replaying snapshots from file");
            Arc::new(FileSnapshotProvider::new(path, config.convert.clone()))
        }
        Err(_) => {
            let api_key = std::env::var("CMC_API_KEY").unwrap_or_default();
            Arc::new(CoinMarketCapClient::new(&config, api_key)?)
        }
    };

    // ── 3. Shared state & engine ─────────────────────────────────────────
    let state = Arc::new(AppState::new());
    let store = Arc::new(JsonFileStore::new(config.state_path.clone()));
    info!(path = %store.path().display(), "State file");
    let mut engine = Engine::new(&config, provider, store, state.clone());

    // ── 4. Start the API server ──────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr = config.bind_addr.clone();

    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(addr = %bind_addr, error = %e, "Failed to bind API server");
                return;
            }
        };
        info!(addr = %bind_addr, "API server listening");
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── 5. Polling loop ──────────────────────────────────────────────────
    let interval_secs = config.poll_interval_secs.max(1);
    let cycle_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Ok(result) = engine.run_cycle().await {
                log_result(&result);
            }
        }
    });

    info!("Scout running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping");
    cycle_task.abort();

    info!("Coin Scout shut down complete.");
    Ok(())
}

/// Render one cycle's lists to the log.
fn log_result(result: &ClassificationResult) {
    info!(cycle_id = %result.cycle_id, as_of = %result.as_of, "── cycle result ──");
    for mover in &result.top_hot {
        info!("hot    {mover}");
    }
    for mover in &result.top_sell {
        info!("sell   {mover}");
    }
    for candidate in &result.buy_candidates {
        info!("buy    {candidate}");
    }
    for ditch in &result.ditch_candidates {
        info!("ditch  {:<20} ({}): {} declines", ditch.name, ditch.symbol, ditch.ditch_streak);
    }
}
