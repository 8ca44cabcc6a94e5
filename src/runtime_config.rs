// =============================================================================
// Runtime Configuration — engine settings with atomic save
// =============================================================================
//
// Every tunable parameter of the scout lives here: where listings come from,
// where state is kept, indicator windows, and classification thresholds.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.  Secrets (the API key) are read
// from the environment and never stored here.
//
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::indicators::IndicatorParams;
use crate::persistence::write_atomic;
use crate::types::{AlertPolicy, StreakPolicy};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_listings_url() -> String {
    "https://pro-api.coinmarketcap.com/v1/cryptocurrency/listings/latest".to_string()
}

fn default_listing_start() -> u32 {
    1
}

fn default_listing_limit() -> u32 {
    80
}

fn default_convert() -> String {
    "USD".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_state_path() -> PathBuf {
    PathBuf::from("previous_prices.json")
}

fn default_snapshot_cache_path() -> Option<PathBuf> {
    Some(PathBuf::from("crypto_data.json"))
}

fn default_bind_addr() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_buy_change_pct() -> f64 {
    0.75
}

fn default_rsi_buy_below() -> f64 {
    40.0
}

fn default_ditch_streak() -> u32 {
    7
}

fn default_fire_streak() -> u32 {
    4
}

fn default_top_n() -> usize {
    5
}

// =============================================================================
// Thresholds
// =============================================================================

/// Classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Percentage change at or above which the momentum buy branch fires.
    #[serde(default = "default_buy_change_pct")]
    pub buy_change_pct: f64,

    /// RSI strictly below this enables the reversal buy branch.
    #[serde(default = "default_rsi_buy_below")]
    pub rsi_buy_below: f64,

    /// Consecutive negative changes before an asset is a ditch candidate.
    #[serde(default = "default_ditch_streak")]
    pub ditch_streak: u32,

    /// Consecutive non-negative changes before an asset is "on fire".
    #[serde(default = "default_fire_streak")]
    pub fire_streak: u32,

    /// Length of the hot and sell lists.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            buy_change_pct: default_buy_change_pct(),
            rsi_buy_below: default_rsi_buy_below(),
            ditch_streak: default_ditch_streak(),
            fire_streak: default_fire_streak(),
            top_n: default_top_n(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Listings source ------------------------------------------------------

    #[serde(default = "default_listings_url")]
    pub listings_url: String,

    /// 1-based rank of the first listing requested.
    #[serde(default = "default_listing_start")]
    pub listing_start: u32,

    /// Number of listings requested per snapshot.
    #[serde(default = "default_listing_limit")]
    pub listing_limit: u32,

    /// Quote currency; prices are read from `quote.<convert>.price`.
    #[serde(default = "default_convert")]
    pub convert: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // --- Scheduling & storage -------------------------------------------------

    /// Seconds between polling cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Where the per-symbol state map is persisted.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Where the raw last-seen snapshot is cached; `null` disables caching.
    #[serde(default = "default_snapshot_cache_path")]
    pub snapshot_cache_path: Option<PathBuf>,

    /// Listen address of the read-only HTTP view.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Engine -----------------------------------------------------------------

    /// Prices retained per asset.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default)]
    pub indicators: IndicatorParams,

    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub streak_policy: StreakPolicy,

    #[serde(default)]
    pub alert_policy: AlertPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            listings_url: default_listings_url(),
            listing_start: default_listing_start(),
            listing_limit: default_listing_limit(),
            convert: default_convert(),
            request_timeout_secs: default_request_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            state_path: default_state_path(),
            snapshot_cache_path: default_snapshot_cache_path(),
            bind_addr: default_bind_addr(),
            history_capacity: default_history_capacity(),
            indicators: IndicatorParams::default(),
            thresholds: Thresholds::default(),
            streak_policy: StreakPolicy::default(),
            alert_policy: AlertPolicy::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            limit = config.listing_limit,
            interval_secs = config.poll_interval_secs,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        write_atomic(path, content.as_bytes())?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
