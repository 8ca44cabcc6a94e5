// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators used by the
// classifier.  Series functions return output aligned to (or, for SMA,
// trailing within) the input; the `IndicatorReading` bundle collapses them to
// the latest values and returns `None` when the history is too short.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

use serde::{Deserialize, Serialize};

use self::bollinger::{latest_bollinger, BollingerPoint};
use self::macd::calculate_macd;
use self::rsi::calculate_rsi;
use self::sma::calculate_sma;

fn default_ma_window() -> usize {
    14
}

fn default_rsi_window() -> usize {
    14
}

fn default_macd_short() -> usize {
    12
}

fn default_macd_long() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bollinger_window() -> usize {
    20
}

fn default_bollinger_k() -> f64 {
    2.0
}

/// Window lengths and multipliers for every indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// Moving-average window; also the minimum history for buy evaluation.
    #[serde(default = "default_ma_window")]
    pub ma_window: usize,

    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,

    #[serde(default = "default_macd_short")]
    pub macd_short: usize,

    #[serde(default = "default_macd_long")]
    pub macd_long: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    /// Minimum history for the lower-band check.
    #[serde(default = "default_bollinger_window")]
    pub bollinger_window: usize,

    /// Standard-deviation multiplier for the bands.
    #[serde(default = "default_bollinger_k")]
    pub bollinger_k: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_window: default_ma_window(),
            rsi_window: default_rsi_window(),
            macd_short: default_macd_short(),
            macd_long: default_macd_long(),
            macd_signal: default_macd_signal(),
            bollinger_window: default_bollinger_window(),
            bollinger_k: default_bollinger_k(),
        }
    }
}

impl IndicatorParams {
    /// Samples required before RSI / MA / MACD are computed.
    pub fn min_history(&self) -> usize {
        self.ma_window.max(self.rsi_window)
    }
}

/// Latest indicator values for one asset's price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorReading {
    pub price: f64,
    pub rsi: f64,
    pub moving_average: f64,
    pub macd: f64,
    pub signal: f64,
}

impl IndicatorReading {
    /// Compute the latest RSI, moving average and MACD/signal over `prices`.
    ///
    /// Returns `None` when fewer than `params.min_history()` samples exist.
    pub fn compute(prices: &[f64], params: &IndicatorParams) -> Option<Self> {
        if prices.len() < params.min_history() {
            return None;
        }

        let price = *prices.last()?;
        let rsi = *calculate_rsi(prices, params.rsi_window).last()?;
        let moving_average = *calculate_sma(prices, params.ma_window).last()?;
        let series = calculate_macd(prices, params.macd_short, params.macd_long, params.macd_signal);
        let macd = *series.macd.last()?;
        let signal = *series.signal.last()?;

        Some(Self {
            price,
            rsi,
            moving_average,
            macd,
            signal,
        })
    }
}

/// Latest Bollinger point when `prices` holds at least a full band window.
pub fn lower_band_touch(prices: &[f64], params: &IndicatorParams) -> Option<BollingerPoint> {
    if prices.len() < params.bollinger_window {
        return None;
    }
    let price = *prices.last()?;
    let band = latest_bollinger(prices, params.bollinger_window, params.bollinger_k)?;
    (price <= band.lower).then_some(band)
}
