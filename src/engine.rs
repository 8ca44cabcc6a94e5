// =============================================================================
// Scout Engine — one polling cycle
// =============================================================================
//
//   fetch -> update history -> classify -> rank -> persist -> publish
//
// The engine exclusively owns the in-memory HistoryStore.  It is loaded once
// at construction and saved after every classified cycle.  Nothing that
// happens inside a cycle is fatal:
//
//   - provider failure / malformed payload: logged, recorded in the error
//     ring, and the last-known-good result stays published
//   - state load failure: warned, engine starts cold
//   - state save failure: logged and recorded, the cycle still completes
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::app_state::AppState;
use crate::classifier::Classifier;
use crate::history::HistoryStore;
use crate::persistence::StateStore;
use crate::provider::SnapshotProvider;
use crate::runtime_config::RuntimeConfig;
use crate::types::ClassificationResult;

pub struct Engine {
    provider: Arc<dyn SnapshotProvider>,
    store: Arc<dyn StateStore>,
    state: Arc<AppState>,
    history: HistoryStore,
    classifier: Classifier,
}

impl Engine {
    /// Build the engine and load persisted history through `store`.
    pub fn new(
        config: &RuntimeConfig,
        provider: Arc<dyn SnapshotProvider>,
        store: Arc<dyn StateStore>,
        state: Arc<AppState>,
    ) -> Self {
        let assets = match store.load() {
            Ok(assets) => assets,
            Err(e) => {
                warn!(error = %e, "failed to load saved state, starting cold");
                state.push_error_with_code(format!("{e:#}"), Some("state_load".into()));
                Default::default()
            }
        };

        let history = HistoryStore::from_assets(assets, config.history_capacity, config.streak_policy);
        info!(
            assets = history.len(),
            capacity = config.history_capacity,
            streak_policy = %config.streak_policy,
            alert_policy = %config.alert_policy,
            "engine initialised"
        );

        Self {
            provider,
            store,
            state,
            history,
            classifier: Classifier::from_config(config),
        }
    }

    /// Run one cycle to completion.
    ///
    /// Returns the fresh result, or the retrieval error after it has been
    /// logged and recorded.  On error the history and the published
    /// (last-known-good) result are left exactly as they were.
    pub async fn run_cycle(&mut self) -> Result<ClassificationResult> {
        let snapshot = match self.provider.fetch().await.context("snapshot retrieval failed") {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let message = format!("{e:#}");
                warn!(error = %message, "cycle skipped, keeping last classification");
                self.state.push_error_with_code(message, Some("provider".into()));
                return Err(e);
            }
        };

        let result = self.classifier.classify(&snapshot, &mut self.history);
        debug!(on_fire = self.classifier.on_fire().len(), "on-fire set carried forward");

        if let Err(e) = self.store.save(self.history.assets()) {
            let message = format!("{e:#}");
            error!(error = %message, "failed to persist state");
            self.state.push_error_with_code(message, Some("state_save".into()));
        }

        self.state.publish(result.clone());
        Ok(result)
    }

    #[cfg(test)]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }
}
