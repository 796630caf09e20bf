//! Census aggregation — the lifecycle ledger and its derived records.
//!
//! The ledger is the single mutable working set of the census pass: one
//! `TickerLifecycle` per distinct ticker ever observed, folded month by
//! month. It is owned by the running job and discarded after the final
//! table is written; the only cross-run state is the persisted CSV.

use std::collections::BTreeMap;

use crate::domain::{CensusRecord, MonthLabel, TickerLifecycle, TickerStatus};
use crate::snapshot::MonthlyExtreme;

/// Destruction percentage for a delisted ticker: `(high - low) / high`.
///
/// `None` when the all-time high is not positive, which keeps the value in
/// `[0, 1]` whenever it is present (given `low <= high`).
pub fn destruction_pct(all_time_high: f64, all_time_low: f64) -> Option<f64> {
    if all_time_high > 0.0 {
        Some((all_time_high - all_time_low) / all_time_high)
    } else {
        None
    }
}

/// Accumulating ticker → lifecycle mapping for one census run.
///
/// Keyed by a `BTreeMap` so record derivation is deterministic: the same
/// dataset always produces the same table, byte for byte.
#[derive(Debug, Default)]
pub struct LifecycleLedger {
    entries: BTreeMap<String, TickerLifecycle>,
}

impl LifecycleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, ticker: &str) -> Option<&TickerLifecycle> {
        self.entries.get(ticker)
    }

    /// Fold one month's per-ticker extremes into the ledger.
    ///
    /// Callers must present months in ascending order; the death month
    /// advances by assignment, not comparison.
    pub fn observe_month(&mut self, month: &MonthLabel, extremes: &[MonthlyExtreme]) {
        for agg in extremes {
            match self.entries.get_mut(&agg.ticker) {
                Some(lc) => lc.observe(month, agg.high, agg.low),
                None => {
                    self.entries.insert(
                        agg.ticker.clone(),
                        TickerLifecycle::first_sighting(month, agg.high, agg.low),
                    );
                }
            }
        }
    }

    /// Derive the census table: classify each ticker against the cutoff
    /// and attach the destruction percentage to delisted rows.
    pub fn to_records(&self, cutoff: &MonthLabel) -> Vec<CensusRecord> {
        self.entries
            .iter()
            .map(|(ticker, lc)| {
                let status = TickerStatus::classify(&lc.death_month, cutoff);
                let destruction = if status.is_delisted() {
                    destruction_pct(lc.all_time_high, lc.all_time_low)
                } else {
                    None
                };
                CensusRecord {
                    ticker: ticker.clone(),
                    birth_month: lc.birth_month.clone(),
                    death_month: lc.death_month.clone(),
                    status,
                    all_time_high: lc.all_time_high,
                    all_time_low: lc.all_time_low,
                    destruction_pct: destruction,
                }
            })
            .collect()
    }
}
