// =============================================================================
// Shared types used across the classification engine
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the two streak counters interact on a non-negative change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreakPolicy {
    /// Every defined change resets the opposite streak.
    #[default]
    Symmetric,
    /// A negative change resets the increase streak, but a non-negative
    /// change leaves the ditch streak untouched.
    Legacy,
}

/// When a symbol may be surfaced again as a buy candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertPolicy {
    /// At most once per symbol, ever.  The alerted flag is saved with the
    /// asset's history, so a restart does not re-arm it; only deleting the
    /// state file does.
    #[default]
    OnceEver,
    /// Re-armed as soon as the symbol stops qualifying.
    UntilExit,
}

impl std::fmt::Display for StreakPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symmetric => write!(f, "Symmetric"),
            Self::Legacy => write!(f, "Legacy"),
        }
    }
}

impl std::fmt::Display for AlertPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnceEver => write!(f, "OnceEver"),
            Self::UntilExit => write!(f, "UntilExit"),
        }
    }
}

// =============================================================================
// Classification output
// =============================================================================

/// One asset's percentage change for the cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub name: String,
    pub symbol: String,
    pub change_pct: f64,
}

impl std::fmt::Display for Mover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<20} ({}): {:>6.2}%", self.name, self.symbol, self.change_pct)
    }
}

/// Which buy branch(es) fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyReason {
    /// Percentage change reached the momentum threshold.
    pub momentum: bool,
    /// RSI below threshold, price above MA, and MACD above signal.
    pub reversal: bool,
}

impl BuyReason {
    pub fn fired(&self) -> bool {
        self.momentum || self.reversal
    }

    /// Reason text naming the branch(es) that fired and their thresholds.
    pub fn describe(&self, buy_change_pct: f64, rsi_below: f64) -> String {
        let momentum = format!("Percentage change >= {buy_change_pct}%");
        let reversal =
            format!("RSI < {rsi_below} and price > moving average and MACD > Signal");
        match (self.momentum, self.reversal) {
            (true, true) => format!("{momentum} and ({reversal})"),
            (true, false) => momentum,
            (false, true) => reversal,
            (false, false) => String::new(),
        }
    }
}

/// An asset newly surfaced as a buy candidate this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyCandidate {
    pub name: String,
    pub symbol: String,
    pub change_pct: f64,
    pub reason: BuyReason,
    /// Human-readable form of `reason`.
    pub reason_text: String,
    pub on_fire: bool,
}

impl std::fmt::Display for BuyCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fire = if self.on_fire { " [FIRE]" } else { "" };
        write!(
            f,
            "{:<20} ({}): {:>6.2}%{} - {}",
            self.name, self.symbol, self.change_pct, fire, self.reason_text
        )
    }
}

/// An asset whose decline streak reached the ditch threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DitchCandidate {
    pub name: String,
    pub symbol: String,
    pub ditch_streak: u32,
}

/// Informational: latest price at or below the lower Bollinger band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTouch {
    pub symbol: String,
    pub price: f64,
    pub lower_band: f64,
}

/// Everything one polling cycle produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub cycle_id: Uuid,
    /// Timestamp of the snapshot the result was computed from.
    pub as_of: DateTime<Utc>,
    pub top_hot: Vec<Mover>,
    pub top_sell: Vec<Mover>,
    pub buy_candidates: Vec<BuyCandidate>,
    pub ditch_candidates: Vec<DitchCandidate>,
    pub lower_band_touches: Vec<BandTouch>,
    /// Snapshot records dropped for missing fields.
    pub skipped_records: usize,
}

impl ClassificationResult {
    /// An empty result, used when a cycle cannot classify anything.
    pub fn empty(as_of: DateTime<Utc>) -> Self {
        Self {
            cycle_id: Uuid::new_v4(),
            as_of,
            top_hot: Vec::new(),
            top_sell: Vec::new(),
            buy_candidates: Vec::new(),
            ditch_candidates: Vec::new(),
            lower_band_touches: Vec::new(),
            skipped_records: 0,
        }
    }
}
