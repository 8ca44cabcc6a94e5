use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::asset_state::{AssetState, DEFAULT_HISTORY_CAPACITY};
use crate::types::StreakPolicy;

/// Outcome of feeding one price into the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceChange {
    /// First sighting of the symbol; nothing to compare against.
    FirstSighting,
    /// The previous price was zero, negative or non-finite.
    Undefined,
    /// `(current - previous) / |previous| * 100`.
    Percent(f64),
}

impl PriceChange {
    pub fn percent(self) -> Option<f64> {
        match self {
            Self::Percent(p) => Some(p),
            _ => None,
        }
    }
}

/// Percentage change from `previous` to `current`, or `None` when the
/// previous price cannot serve as a base.
pub fn percentage_change(current: f64, previous: f64) -> Option<f64> {
    if !previous.is_finite() || previous <= 0.0 {
        return None;
    }
    Some((current - previous) / previous.abs() * 100.0)
}

// ---------------------------------------------------------------------------
// HistoryStore -- symbol -> AssetState
// ---------------------------------------------------------------------------

/// Owns every `AssetState` and all per-cycle state transitions.
///
/// The map is ordered by symbol so that persisted output is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStore {
    assets: BTreeMap<String, AssetState>,
    capacity: usize,
    streak_policy: StreakPolicy,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY, StreakPolicy::default())
    }
}

impl HistoryStore {
    pub fn new(capacity: usize, streak_policy: StreakPolicy) -> Self {
        Self {
            assets: BTreeMap::new(),
            capacity,
            streak_policy,
        }
    }

    /// Rebuild a store from persisted state, trimming any history that
    /// exceeds `capacity`.
    pub fn from_assets(
        mut assets: BTreeMap<String, AssetState>,
        capacity: usize,
        streak_policy: StreakPolicy,
    ) -> Self {
        for state in assets.values_mut() {
            if state.history.len() > capacity {
                debug!(symbol = %state.symbol, len = state.history.len(), capacity, "trimming loaded history");
                state.trim(capacity);
            }
        }
        Self {
            assets,
            capacity,
            streak_policy,
        }
    }

    /// Apply one observed price for `symbol`.
    ///
    /// * Unseen symbols are created and report [`PriceChange::FirstSighting`].
    /// * The price is always appended to the history ring and becomes
    ///   `last_price`.
    /// * Streak counters move only when the change is defined.
    pub fn update(&mut self, symbol: &str, name: &str, price: f64) -> PriceChange {
        let capacity = self.capacity;
        let policy = self.streak_policy;

        let Some(state) = self.assets.get_mut(symbol) else {
            let mut state = AssetState::new(symbol, name, price);
            state.push_price(price, capacity);
            self.assets.insert(symbol.to_string(), state);
            return PriceChange::FirstSighting;
        };

        let change = match percentage_change(price, state.last_price) {
            Some(pct) => PriceChange::Percent(pct),
            None => {
                warn!(symbol, previous = state.last_price, "previous price unusable, change undefined");
                PriceChange::Undefined
            }
        };

        state.name = name.to_string();
        state.push_price(price, capacity);
        state.last_price = price;

        if let PriceChange::Percent(pct) = change {
            if pct < 0.0 {
                state.ditch_streak += 1;
                state.increase_streak = 0;
            } else {
                state.increase_streak += 1;
                if policy == StreakPolicy::Symmetric {
                    state.ditch_streak = 0;
                }
            }
        }

        change
    }

    #[cfg(test)]
    pub fn get(&self, symbol: &str) -> Option<&AssetState> {
        self.assets.get(symbol)
    }

    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut AssetState> {
        self.assets.get_mut(symbol)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AssetState> {
        self.assets.values_mut()
    }

    pub fn assets(&self) -> &BTreeMap<String, AssetState> {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
