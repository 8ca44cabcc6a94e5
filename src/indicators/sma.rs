// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Unweighted mean over a trailing window.  Only "valid" windows are emitted:
// a series of length `n` yields `n - window + 1` averages, the first one
// covering `prices[0..window]`.
// =============================================================================

/// Compute the SMA series for `prices` over `window` samples.
///
/// Element `i` of the result is the mean of `prices[i..i + window]`.
///
/// # Edge cases
/// - `window == 0` => empty vec
/// - `prices.len() < window` => empty vec
pub fn calculate_sma(prices: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || prices.len() < window {
        return Vec::new();
    }

    let window_f = window as f64;
    prices
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window_f)
        .collect()
}
