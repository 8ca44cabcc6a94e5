// =============================================================================
// Classifier — hot / sell / buy / ditch
// =============================================================================
//
// Consumes one snapshot, drives the HistoryStore through its per-asset state
// transitions, and emits the cycle's four lists.
//
// Pipeline per cycle:
//   1. For each complete record: update history, collect the defined change,
//      apply the ditch rule and grow the on-fire set.
//   2. Flag lower Bollinger band touches (informational only).
//   3. Rank changes; slice hot / sell.
//   4. Walk the ranked changes and evaluate both buy branches for assets with
//      enough history; suppress already-alerted symbols.
//   5. Replace the on-fire set with (buy qualifiers - ditch candidates).
//
// Buy branches:
//   momentum: change >= buy_change_pct
//   reversal: RSI < rsi_buy_below && price > MA && MACD > signal
// =============================================================================

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::history::HistoryStore;
use crate::indicators::{lower_band_touch, IndicatorParams, IndicatorReading};
use crate::ranking::{sort_descending, top_and_bottom};
use crate::runtime_config::{RuntimeConfig, Thresholds};
use crate::snapshot::Snapshot;
use crate::types::{
    AlertPolicy, BandTouch, BuyCandidate, BuyReason, ClassificationResult, DitchCandidate, Mover,
};

/// Evaluate both buy branches for one asset.
pub fn evaluate_buy(change_pct: f64, reading: &IndicatorReading, thresholds: &Thresholds) -> BuyReason {
    BuyReason {
        momentum: change_pct >= thresholds.buy_change_pct,
        reversal: reading.rsi < thresholds.rsi_buy_below
            && reading.price > reading.moving_average
            && reading.macd > reading.signal,
    }
}

/// Stateful classifier.  The on-fire set is carried from one cycle to the
/// next; everything else lives in the `HistoryStore`.
pub struct Classifier {
    params: IndicatorParams,
    thresholds: Thresholds,
    alert_policy: AlertPolicy,
    on_fire: HashSet<String>,
}

impl Classifier {
    pub fn new(params: IndicatorParams, thresholds: Thresholds, alert_policy: AlertPolicy) -> Self {
        Self {
            params,
            thresholds,
            alert_policy,
            on_fire: HashSet::new(),
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(
            config.indicators.clone(),
            config.thresholds.clone(),
            config.alert_policy,
        )
    }

    pub fn on_fire(&self) -> &HashSet<String> {
        &self.on_fire
    }

    /// Run one cycle over `snapshot`, mutating `store` in place.
    pub fn classify(&mut self, snapshot: &Snapshot, store: &mut HistoryStore) -> ClassificationResult {
        let mut result = ClassificationResult::empty(snapshot.fetched_at);
        let mut movers: Vec<Mover> = Vec::with_capacity(snapshot.records.len());
        let mut readings: HashMap<String, IndicatorReading> = HashMap::new();

        // ── 1. History updates, ditch rule, on-fire growth ───────────────
        for record in &snapshot.records {
            let Some(quote) = record.quote() else {
                warn!(
                    name = ?record.name,
                    symbol = ?record.symbol,
                    "skipping record due to missing data"
                );
                result.skipped_records += 1;
                continue;
            };

            let change = store.update(quote.symbol, quote.name, quote.price);
            let Some(state) = store.get_mut(quote.symbol) else {
                continue;
            };

            if let Some(pct) = change.percent() {
                debug!(symbol = %quote.symbol, change = pct, "percentage change");
                movers.push(Mover {
                    name: quote.name.to_string(),
                    symbol: quote.symbol.to_string(),
                    change_pct: pct,
                });

                // A negative change has already zeroed the increase streak.
                if pct < 0.0 && state.ditch_streak >= self.thresholds.ditch_streak {
                    result.ditch_candidates.push(DitchCandidate {
                        name: quote.name.to_string(),
                        symbol: quote.symbol.to_string(),
                        ditch_streak: state.ditch_streak,
                    });
                }

                if state.increase_streak >= self.thresholds.fire_streak {
                    self.on_fire.insert(quote.symbol.to_string());
                }
            }

            // ── 2. Indicator diagnostics ─────────────────────────────────
            let prices = state.prices();
            if let Some(band) = lower_band_touch(&prices, &self.params) {
                info!(
                    name = %quote.name,
                    symbol = %quote.symbol,
                    price = quote.price,
                    lower_band = band.lower,
                    "touched or crossed the lower Bollinger band"
                );
                result.lower_band_touches.push(BandTouch {
                    symbol: quote.symbol.to_string(),
                    price: quote.price,
                    lower_band: band.lower,
                });
            }
            if let Some(reading) = IndicatorReading::compute(&prices, &self.params) {
                debug!(
                    symbol = %quote.symbol,
                    rsi = reading.rsi,
                    moving_average = reading.moving_average,
                    macd = reading.macd,
                    signal = reading.signal,
                    "indicators"
                );
                readings.insert(quote.symbol.to_string(), reading);
            }
        }

        // ── 3. Ranking ───────────────────────────────────────────────────
        sort_descending(&mut movers);
        let (top_hot, top_sell) = top_and_bottom(&movers, self.thresholds.top_n);
        result.top_hot = top_hot;
        result.top_sell = top_sell;

        // ── 4. Buy evaluation ────────────────────────────────────────────
        let mut qualifying: HashSet<String> = HashSet::new();
        for mover in &movers {
            let Some(reading) = readings.get(&mover.symbol) else {
                continue;
            };
            let reason = evaluate_buy(mover.change_pct, reading, &self.thresholds);
            if !reason.fired() {
                continue;
            }
            qualifying.insert(mover.symbol.clone());

            let Some(state) = store.get_mut(&mover.symbol) else {
                continue;
            };
            if state.alerted {
                debug!(symbol = %mover.symbol, "buy signal suppressed, already alerted");
                continue;
            }
            state.alerted = true;

            let on_fire = self.on_fire.contains(&mover.symbol);
            if on_fire {
                info!(name = %mover.name, symbol = %mover.symbol, "catching fire");
            }

            let reason_text = reason.describe(self.thresholds.buy_change_pct, self.thresholds.rsi_buy_below);
            info!(
                name = %mover.name,
                symbol = %mover.symbol,
                reason = %reason_text,
                "coin alert: added to the buy list"
            );
            result.buy_candidates.push(BuyCandidate {
                name: mover.name.clone(),
                symbol: mover.symbol.clone(),
                change_pct: mover.change_pct,
                reason,
                reason_text,
                on_fire,
            });
        }

        if self.alert_policy == AlertPolicy::UntilExit {
            for state in store.iter_mut() {
                if state.alerted && !qualifying.contains(&state.symbol) {
                    debug!(symbol = %state.symbol, "left the buy set, alert re-armed");
                    state.alerted = false;
                }
            }
        }

        // ── 5. Carry the on-fire set ─────────────────────────────────────
        for ditched in &result.ditch_candidates {
            qualifying.remove(&ditched.symbol);
        }
        self.on_fire = qualifying;

        info!(
            cycle_id = %result.cycle_id,
            changes = movers.len(),
            buys = result.buy_candidates.len(),
            ditches = result.ditch_candidates.len(),
            skipped = result.skipped_records,
            "classification complete"
        );

        result
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;

    use crate::snapshot::SnapshotRecord;
    use crate::types::StreakPolicy;

    fn snap(quotes: &[(&str, f64)]) -> Snapshot {
        let records = quotes
            .iter()
            .map(|(symbol, price)| SnapshotRecord::new(&symbol.to_lowercase(), symbol, *price))
            .collect();
        Snapshot::new(Utc::now(), records)
    }

    fn classifier(policy: AlertPolicy) -> Classifier {
        Classifier::new(IndicatorParams::default(), Thresholds::default(), policy)
    }

    fn store() -> HistoryStore {
        HistoryStore::new(30, StreakPolicy::Symmetric)
    }

    /// Feed a single-asset price path, returning the result of every cycle.
    fn run_path(
        classifier: &mut Classifier,
        store: &mut HistoryStore,
        symbol: &str,
        prices: &[f64],
    ) -> Vec<ClassificationResult> {
        prices
            .iter()
            .map(|p| classifier.classify(&snap(&[(symbol, *p)]), store))
            .collect()
    }

    fn buy_symbols(result: &ClassificationResult) -> Vec<&str> {
        result.buy_candidates.iter().map(|b| b.symbol.as_str()).collect()
    }

    // ---- evaluate_buy ----------------------------------------------------

    #[test]
    fn reversal_branch_fires_below_momentum_threshold() {
        let reading = IndicatorReading {
            price: 110.0,
            rsi: 35.0,
            moving_average: 100.0,
            macd: 2.0,
            signal: 1.0,
        };
        let thresholds = Thresholds::default();
        let reason = evaluate_buy(0.3, &reading, &thresholds);
        assert!(reason.fired());
        assert!(!reason.momentum);
        assert!(reason.reversal);
        assert_eq!(
            reason.describe(thresholds.buy_change_pct, thresholds.rsi_buy_below),
            "RSI < 40 and price > moving average and MACD > Signal"
        );
    }

    #[test]
    fn reversal_branch_needs_all_three_conditions() {
        let thresholds = Thresholds::default();
        let base = IndicatorReading {
            price: 110.0,
            rsi: 35.0,
            moving_average: 100.0,
            macd: 2.0,
            signal: 1.0,
        };
        let high_rsi = IndicatorReading { rsi: 40.0, ..base };
        let below_ma = IndicatorReading { price: 100.0, ..base };
        let weak_macd = IndicatorReading { macd: 1.0, ..base };
        for reading in [high_rsi, below_ma, weak_macd] {
            assert!(!evaluate_buy(0.3, &reading, &thresholds).fired());
        }
        assert!(evaluate_buy(0.75, &high_rsi, &thresholds).momentum);
    }

    // ---- snapshot handling -------------------------------------------------

    #[test]
    fn incomplete_records_are_skipped() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let snapshot = Snapshot::new(
            Utc::now(),
            vec![
                SnapshotRecord::new("Bitcoin", "BTC", 100.0),
                SnapshotRecord {
                    name: None,
                    symbol: Some("ANON".into()),
                    price: Some(1.0),
                },
                SnapshotRecord {
                    name: Some("NoPrice".into()),
                    symbol: Some("NOP".into()),
                    price: None,
                },
            ],
        );
        let result = c.classify(&snapshot, &mut store);
        assert_eq!(result.skipped_records, 2);
        assert_eq!(store.len(), 1);
        assert!(store.get("ANON").is_none());
    }

    #[test]
    fn first_sighting_produces_no_movers() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let result = c.classify(&snap(&[("BTC", 100.0), ("ETH", 10.0)]), &mut store);
        assert!(result.top_hot.is_empty());
        assert!(result.top_sell.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn same_snapshot_twice_yields_zero_changes() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let quotes = [("BTC", 100.0), ("ETH", 10.0), ("SOL", 0.5)];
        c.classify(&snap(&quotes), &mut store);
        let result = c.classify(&snap(&quotes), &mut store);

        assert_eq!(result.top_hot.len(), 3);
        assert!(result.top_hot.iter().all(|m| m.change_pct == 0.0));
        for (symbol, _) in quotes {
            let state = store.get(symbol).unwrap();
            assert_eq!(state.increase_streak, 1);
            assert_eq!(state.ditch_streak, 0);
        }
    }

    #[test]
    fn undefined_change_is_excluded_from_ranking() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        c.classify(&snap(&[("ZERO", 0.0), ("BTC", 100.0)]), &mut store);
        let result = c.classify(&snap(&[("ZERO", 3.0), ("BTC", 101.0)]), &mut store);
        assert_eq!(result.top_hot.len(), 1);
        assert_eq!(result.top_hot[0].symbol, "BTC");
    }

    #[test]
    fn hot_and_sell_follow_ranking() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        c.classify(&snap(&[("A", 100.0), ("B", 100.0), ("C", 100.0)]), &mut store);
        let result = c.classify(&snap(&[("A", 105.0), ("B", 97.0), ("C", 101.0)]), &mut store);
        assert_eq!(result.top_hot[0].symbol, "A");
        assert_eq!(result.top_sell.last().unwrap().symbol, "B");
    }

    // ---- ditch rule --------------------------------------------------------

    #[test]
    fn ditch_on_seventh_consecutive_decline() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let prices: Vec<f64> = (0..9).map(|i| 100.0 - i as f64).collect();
        let results = run_path(&mut c, &mut store, "DOGE", &prices);

        // results[0] is the first sighting; results[k] is the k-th decline.
        for result in &results[..7] {
            assert!(result.ditch_candidates.is_empty());
        }
        assert_eq!(results[7].ditch_candidates.len(), 1);
        assert_eq!(results[7].ditch_candidates[0].symbol, "DOGE");
        assert_eq!(results[7].ditch_candidates[0].ditch_streak, 7);
        assert_eq!(results[8].ditch_candidates[0].ditch_streak, 8);
        assert_eq!(store.get("DOGE").unwrap().increase_streak, 0);
    }

    #[test]
    fn ditch_after_rally_clears_increase_streak() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let mut prices = vec![100.0, 101.0, 102.0, 103.0];
        prices.extend((1..=7).map(|i| 103.0 - i as f64));
        let results = run_path(&mut c, &mut store, "DOGE", &prices);

        assert_eq!(results[3].ditch_candidates.len(), 0);
        assert_eq!(results.last().unwrap().ditch_candidates[0].symbol, "DOGE");
        let state = store.get("DOGE").unwrap();
        assert_eq!(state.ditch_streak, 7);
        assert_eq!(state.increase_streak, 0);
    }

    #[test]
    fn rise_interrupts_the_decline_streak() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let prices = [100.0, 99.0, 98.0, 97.0, 96.0, 95.0, 95.5, 95.0, 94.0];
        let results = run_path(&mut c, &mut store, "DOGE", &prices);
        assert!(results.iter().all(|r| r.ditch_candidates.is_empty()));
        assert_eq!(store.get("DOGE").unwrap().ditch_streak, 2);
    }

    #[test]
    fn legacy_streaks_ditch_only_on_declines() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = HistoryStore::new(30, StreakPolicy::Legacy);
        let prices = [100.0, 99.0, 98.0, 97.0, 96.0, 95.0, 94.0, 93.0, 93.5, 93.0];
        let results = run_path(&mut c, &mut store, "DOGE", &prices);

        assert_eq!(results[7].ditch_candidates.len(), 1);
        // The rise neither ditches nor resets the decline streak.
        assert!(results[8].ditch_candidates.is_empty());
        assert_eq!(results[9].ditch_candidates[0].ditch_streak, 8);
        assert_eq!(store.get("DOGE").unwrap().increase_streak, 0);
    }

    // ---- buy rule ------------------------------------------------------------

    #[test]
    fn buy_requires_full_indicator_history() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let results = run_path(&mut c, &mut store, "PEPE", &[1.0, 1.0, 1.0, 2.0]);
        assert!(results.iter().all(|r| r.buy_candidates.is_empty()));
    }

    #[test]
    fn momentum_buy_once_enough_history() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let mut prices = vec![100.0; 13];
        prices.push(101.0);
        let results = run_path(&mut c, &mut store, "BTC", &prices);

        let last = results.last().unwrap();
        assert_eq!(buy_symbols(last), vec!["BTC"]);
        let candidate = &last.buy_candidates[0];
        assert!(candidate.reason.momentum);
        assert!(candidate.reason_text.contains("Percentage change >= 0.75%"));
        assert!((candidate.change_pct - 1.0).abs() < 1e-9);
        assert!(store.get("BTC").unwrap().alerted);
    }

    #[test]
    fn reversal_buy_from_price_history() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let prices = [
            100.0, 97.54, 95.6, 92.98, 95.16, 97.12, 95.39, 96.74, 94.96, 96.74, 96.12, 96.44,
            97.44, 97.85, 96.02, 96.2,
        ];
        let results = run_path(&mut c, &mut store, "SOL", &prices);

        assert!(results[..15].iter().all(|r| r.buy_candidates.is_empty()));
        let last = results.last().unwrap();
        assert_eq!(buy_symbols(last), vec!["SOL"]);

        let candidate = &last.buy_candidates[0];
        assert!(candidate.reason.reversal && !candidate.reason.momentum);
        assert!(candidate.change_pct > 0.0 && candidate.change_pct < 0.75);
        assert_eq!(
            candidate.reason_text,
            "RSI < 40 and price > moving average and MACD > Signal"
        );
        assert!(!candidate.on_fire);

        let state = store.get("SOL").unwrap();
        assert!(state.alerted);
        let reading = IndicatorReading::compute(&state.prices(), &IndicatorParams::default()).unwrap();
        assert!(reading.rsi < 40.0);
        assert!(reading.price > reading.moving_average);
        assert!(reading.macd > reading.signal);
    }

    #[test]
    fn alert_once_ever_suppresses_repeat() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let mut prices = vec![100.0; 13];
        prices.extend([101.0, 99.0, 100.0]);
        let results = run_path(&mut c, &mut store, "BTC", &prices);

        assert_eq!(buy_symbols(&results[13]), vec!["BTC"]);
        assert!(results[14].buy_candidates.is_empty());
        assert!(results[15].buy_candidates.is_empty());
    }

    #[test]
    fn alert_until_exit_rearms_after_leaving() {
        let mut c = classifier(AlertPolicy::UntilExit);
        let mut store = store();
        let mut prices = vec![100.0; 13];
        prices.extend([101.0, 99.0, 100.0]);
        let results = run_path(&mut c, &mut store, "BTC", &prices);

        assert_eq!(buy_symbols(&results[13]), vec!["BTC"]);
        assert!(results[14].buy_candidates.is_empty());
        assert_eq!(buy_symbols(&results[15]), vec!["BTC"]);
    }

    // ---- on-fire marker ------------------------------------------------------

    #[test]
    fn steady_riser_is_on_fire() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let mut prices = vec![100.0; 13];
        prices.push(101.0);
        let results = run_path(&mut c, &mut store, "BTC", &prices);

        assert!(results.last().unwrap().buy_candidates[0].on_fire);
        assert!(c.on_fire().contains("BTC"));
    }

    #[test]
    fn rebound_after_decline_is_not_on_fire() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let mut prices = vec![100.0; 10];
        prices.extend([99.0, 98.0, 97.5, 99.0]);
        let results = run_path(&mut c, &mut store, "ETH", &prices);

        let last = results.last().unwrap();
        assert_eq!(buy_symbols(last), vec!["ETH"]);
        assert!(!last.buy_candidates[0].on_fire);
        // Qualifying this cycle carries it into the next cycle's set.
        assert!(c.on_fire().contains("ETH"));
    }

    #[test]
    fn on_fire_set_drops_non_qualifiers() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let mut prices = vec![100.0; 13];
        prices.extend([101.0, 99.0]);
        run_path(&mut c, &mut store, "BTC", &prices);
        assert!(c.on_fire().is_empty());
    }

    // ---- informational ---------------------------------------------------------

    #[test]
    fn lower_band_touch_is_reported() {
        let mut c = classifier(AlertPolicy::OnceEver);
        let mut store = store();
        let mut prices: Vec<f64> = (0..19).map(|x| 100.0 + (x % 2) as f64).collect();
        prices.push(80.0);
        let results = run_path(&mut c, &mut store, "SOL", &prices);

        assert!(results[..19].iter().all(|r| r.lower_band_touches.is_empty()));
        let touches = &results[19].lower_band_touches;
        assert_eq!(touches.len(), 1);
        assert_eq!(touches[0].symbol, "SOL");
        assert!(touches[0].price <= touches[0].lower_band);
    }
}
