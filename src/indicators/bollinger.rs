// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (rolling mean), an upper band
// (mean + k*σ) and a lower band (mean - k*σ), where σ is the rolling *sample*
// standard deviation (n - 1 denominator).
//
// Bands are undefined until a full window is available, so the series hold
// `None` for the first `window - 1` indices.
// =============================================================================

/// Band values at a single index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Compute rolling Bollinger Bands aligned to `closes`.
///
/// Element `i` is `Some` only when `i + 1 >= window`.
///
/// # Edge cases
/// - `window < 2` => every element is `None` (sample σ needs two points)
pub fn calculate_bollinger(closes: &[f64], window: usize, k: f64) -> Vec<Option<BollingerPoint>> {
    if window < 2 {
        return vec![None; closes.len()];
    }

    let window_f = window as f64;
    let mut bands = vec![None; window.saturating_sub(1).min(closes.len())];

    for w in closes.windows(window) {
        let middle = w.iter().sum::<f64>() / window_f;
        let variance = w.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / (window_f - 1.0);
        let std_dev = variance.sqrt();

        bands.push(Some(BollingerPoint {
            upper: middle + k * std_dev,
            middle,
            lower: middle - k * std_dev,
        }));
    }

    bands
}

/// Latest band point, if a full window exists.
pub fn latest_bollinger(closes: &[f64], window: usize, k: f64) -> Option<BollingerPoint> {
    calculate_bollinger(closes, window, k).last().copied().flatten()
}
