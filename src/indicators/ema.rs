// =============================================================================
// Exponential Moving Average (EMA) — normalised exponential kernel
// =============================================================================
//
// Rather than the recursive `2 / (period + 1)` form, this EMA convolves the
// price series with a fixed kernel of `window` weights:
//
//   w_k = exp(-1 + k / (window - 1))      k = 0 .. window-1
//   w   = w / sum(w)
//   a_n = sum_k  w_k * p_{n-k}            (terms with n-k < 0 are dropped)
//
// The first `window` outputs only see a partial kernel, so they are
// backfilled with `a_window`.  When the series is not longer than the window
// the result is a constant series equal to the first price.
// =============================================================================

/// Build the normalised kernel `exp(linspace(-1, 0, window)) / sum`.
fn kernel(window: usize) -> Vec<f64> {
    let step = if window > 1 {
        1.0 / (window - 1) as f64
    } else {
        0.0
    };
    let raw: Vec<f64> = (0..window).map(|k| (-1.0 + k as f64 * step).exp()).collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Compute the EMA series for `prices` over `window`.
///
/// The output always has the same length as `prices`.
///
/// # Edge cases
/// - empty input => empty vec
/// - `window == 0` or `window >= prices.len()` => every element is `prices[0]`
pub fn calculate_ema(prices: &[f64], window: usize) -> Vec<f64> {
    let Some(&first) = prices.first() else {
        return Vec::new();
    };
    if window == 0 || window >= prices.len() {
        return vec![first; prices.len()];
    }

    let weights = kernel(window);
    let mut result: Vec<f64> = (0..prices.len())
        .map(|n| {
            weights
                .iter()
                .enumerate()
                .take_while(|(k, _)| *k <= n)
                .map(|(k, w)| w * prices[n - k])
                .sum()
        })
        .collect();

    let settled = result[window];
    for value in result.iter_mut().take(window) {
        *value = settled;
    }

    result
}
