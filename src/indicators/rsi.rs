// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive prices.
// Step 2 — Seed average gain / average loss with the sum of the first
//          `window` gains / losses divided by `window`.
// Step 3 — For every index i >= window apply Wilder's smoothing with the
//          delta that ends at i-1:
//            avg_gain = (avg_gain * (window - 1) + gain) / window
//            avg_loss = (avg_loss * (window - 1) + loss) / window
// Step 4 — RS  = avg_gain / avg_loss   (0 when avg_loss == 0)
//          RSI = 100 - 100 / (1 + RS)
//
// The output is aligned to the input: indices below `window` carry the seed
// RSI so the series has no leading gap.
// =============================================================================

/// Compute the RSI series for `prices`; the result has `prices.len()` values.
///
/// # Edge cases
/// - fewer than 2 prices or `window == 0` => empty vec
/// - fewer than `window` deltas => the seed uses whatever deltas exist, still
///   divided by `window`
/// - average loss of zero => RS is 0, so RSI is 0 rather than a division fault
pub fn calculate_rsi(prices: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || prices.len() < 2 {
        return Vec::new();
    }

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let window_f = window as f64;

    let seed_len = window.min(deltas.len());
    let (sum_gain, sum_loss) = deltas[..seed_len].iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
        if d >= 0.0 {
            (g + d, l)
        } else {
            (g, l - d)
        }
    });

    let mut avg_gain = sum_gain / window_f;
    let mut avg_loss = sum_loss / window_f;

    let seed_rsi = rsi_from_averages(avg_gain, avg_loss);
    let mut result = vec![seed_rsi; prices.len().min(window)];

    for i in window..prices.len() {
        let delta = deltas[i - 1];
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { -delta } else { 0.0 };

        avg_gain = (avg_gain * (window_f - 1.0) + gain) / window_f;
        avg_loss = (avg_loss * (window_f - 1.0) + loss) / window_f;

        result.push(rsi_from_averages(avg_gain, avg_loss));
    }

    result
}

// =============================================================================
// Internal helpers
// =============================================================================

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss != 0.0 { avg_gain / avg_loss } else { 0.0 };
    100.0 - 100.0 / (1.0 + rs)
}
