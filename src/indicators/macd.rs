// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd   = EMA(prices, short) - EMA(prices, long)
//   signal = EMA(macd, signal)
//
// Both series are aligned to the input prices.
// =============================================================================

use super::ema::calculate_ema;

/// MACD line and its signal line, one value per input price.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

/// Compute MACD and signal series.
///
/// Inherits the EMA edge-case policy: any window that is not shorter than the
/// series degrades to a constant, so short histories still yield aligned
/// output (a zero MACD line when both EMAs are constant).
pub fn calculate_macd(prices: &[f64], short: usize, long: usize, signal: usize) -> MacdSeries {
    let ema_short = calculate_ema(prices, short);
    let ema_long = calculate_ema(prices, long);

    let macd: Vec<f64> = ema_short
        .iter()
        .zip(ema_long.iter())
        .map(|(s, l)| s - l)
        .collect();
    let signal = calculate_ema(&macd, signal);

    MacdSeries { macd, signal }
}
