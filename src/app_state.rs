// =============================================================================
// Central Application State — read side of the scout
// =============================================================================
//
// The engine task owns all mutable classification state; AppState only holds
// what it publishes for the HTTP view: the latest result and a ring of recent
// errors.
//
// Thread safety:
//   - Atomic counters for lock-free version tracking.
//   - parking_lot::RwLock for the shared collections.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::types::ClassificationResult;

// =============================================================================
// Error Record
// =============================================================================

/// A recorded error event for the diagnostics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// Where the failure happened (`provider`, `state_load`, `state_save`).
    pub code: Option<String>,
    /// ISO 8601 timestamp.
    pub at: String,
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Shared state handed to the API via `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Monotonically increasing version counter, bumped on every publish
    /// and every recorded error.
    pub state_version: AtomicU64,

    /// Number of cycles that produced a classification.
    pub cycles_completed: AtomicU64,

    // ── Classification ──────────────────────────────────────────────────
    pub latest: RwLock<Option<ClassificationResult>>,

    // ── Error Log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    // ── Timing ──────────────────────────────────────────────────────────
    pub start_time: std::time::Instant,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            state_version: AtomicU64::new(1),
            cycles_completed: AtomicU64::new(0),
            latest: RwLock::new(None),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Classification ──────────────────────────────────────────────────

    /// Replace the published result.
    pub fn publish(&self, result: ClassificationResult) {
        *self.latest.write() = Some(result);
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.increment_version();
    }

    pub fn latest(&self) -> Option<ClassificationResult> {
        self.latest.read().clone()
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error with an optional machine-readable code. The ring
    /// buffer is capped at [`MAX_RECENT_ERRORS`]; oldest entries are evicted
    /// when the limit is reached.
    pub fn push_error_with_code(&self, msg: String, code: Option<String>) {
        let record = ErrorRecord {
            message: msg,
            code,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.recent_errors.read().clone()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
