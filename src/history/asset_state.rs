use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of prices retained per asset.
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Per-symbol state carried across polling cycles.
///
/// `history` is a FIFO ring of the most recent prices, oldest first.  The
/// two streak counters track consecutive negative / non-negative percentage
/// changes; `alerted` records that the symbol has already been surfaced as a
/// buy candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetState {
    pub symbol: String,
    pub name: String,
    pub last_price: f64,
    #[serde(default)]
    pub history: VecDeque<f64>,
    #[serde(default)]
    pub ditch_streak: u32,
    #[serde(default)]
    pub increase_streak: u32,
    #[serde(default)]
    pub alerted: bool,
}

impl AssetState {
    /// Fresh state for a symbol seen for the first time.
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            last_price: price,
            history: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY + 1),
            ditch_streak: 0,
            increase_streak: 0,
            alerted: false,
        }
    }

    /// Append `price` and trim the oldest entries so at most `capacity` remain.
    pub fn push_price(&mut self, price: f64, capacity: usize) {
        self.history.push_back(price);
        self.trim(capacity);
    }

    /// Drop the oldest prices until the ring fits `capacity`.
    pub fn trim(&mut self, capacity: usize) {
        while self.history.len() > capacity {
            self.history.pop_front();
        }
    }

    /// History as a contiguous, oldest-first vector for the indicator functions.
    pub fn prices(&self) -> Vec<f64> {
        self.history.iter().copied().collect()
    }
}
