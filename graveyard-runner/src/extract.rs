//! Extraction job — ranked death metrics for the most liquid failures.
//!
//! Reads the census, narrows to confirmed failures, bounds the candidate
//! pool by lifespan, then re-reads only the death-month files (each at
//! most once) to compute per-ticker metrics. Output is capped and ranked
//! by the dollar-volume liquidity proxy.

use graveyard_core::domain::{CensusRecord, FailureMetricRecord, MonthLabel};
use graveyard_core::metrics::DeathMetrics;
use graveyard_core::snapshot::SnapshotStore;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::ExtractConfig;
use crate::export::{self, ExportError};
use crate::progress::ScanProgress;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The census is a trusted precondition; a missing or malformed table
    /// aborts the job.
    #[error("census table: {0}")]
    Census(ExportError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Counts reported after an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    pub census_rows: usize,
    /// Dead tickers over the destruction threshold, before pooling.
    pub candidates: usize,
    /// Candidates kept after the lifespan ranking.
    pub pool: usize,
    pub files_read: usize,
    pub files_missing: usize,
    pub files_skipped: usize,
    pub records: usize,
    /// `None` when no metric records were produced (a valid terminal
    /// state, not a failure).
    pub metrics_path: Option<PathBuf>,
}

/// Run the extraction to completion.
pub fn run_extraction(
    config: &ExtractConfig,
    progress: &dyn ScanProgress,
) -> Result<ExtractSummary, ExtractError> {
    let census = export::read_census(&config.census_path).map_err(ExtractError::Census)?;
    let census_rows = census.len();

    let mut candidates: Vec<&CensusRecord> = census
        .iter()
        .filter(|r| {
            r.status.is_delisted()
                && r.destruction_pct
                    .is_some_and(|pct| pct >= config.min_destruction)
        })
        .collect();
    let candidate_count = candidates.len();

    if candidates.is_empty() {
        return Ok(ExtractSummary {
            census_rows,
            candidates: 0,
            pool: 0,
            files_read: 0,
            files_missing: 0,
            files_skipped: 0,
            records: 0,
            metrics_path: None,
        });
    }

    // Longest-lived failures first; lifespan is the data-quality proxy
    // that bounds how many files get re-opened.
    candidates.sort_by(|a, b| lifespan_days(b).cmp(&lifespan_days(a)));
    candidates.truncate(config.search_pool);
    let pool = candidates.len();

    // Group by death month so each snapshot file is opened at most once.
    let mut by_month: BTreeMap<&MonthLabel, Vec<String>> = BTreeMap::new();
    for record in &candidates {
        by_month
            .entry(&record.death_month)
            .or_default()
            .push(record.ticker.clone());
    }

    let store = SnapshotStore::new(&config.data_dir);
    let total_files = by_month.len();
    let mut files_read = 0usize;
    let mut files_missing = 0usize;
    let mut files_skipped = 0usize;
    let mut metrics: Vec<FailureMetricRecord> = Vec::new();

    for (i, (month, tickers)) in by_month.iter().enumerate() {
        progress.on_file_start(month.as_str(), i, total_files);

        let Some(file) = store.resolve(month) else {
            files_missing += 1;
            continue;
        };

        let traces = match store.load_death_traces(&file, tickers) {
            Ok(traces) => traces,
            Err(e) => {
                files_skipped += 1;
                progress.on_file_skipped(month.as_str(), &e);
                continue;
            }
        };
        files_read += 1;

        for (ticker, rows) in &traces {
            // Liquidity gate, independent of the destruction filter.
            if rows.len() < config.min_trace_rows {
                continue;
            }
            let closes: Vec<f64> = rows.iter().map(|r| r.close).collect();
            let volumes: Vec<f64> = rows.iter().map(|r| r.volume).collect();
            let m = DeathMetrics::compute(&closes, &volumes);
            metrics.push(FailureMetricRecord {
                ticker: ticker.clone(),
                dollar_volume: m.dollar_volume,
                exodus_ratio: m.exodus_ratio,
                volatility: m.volatility,
                final_drop_pct: m.final_drop_pct,
                death_date: (*month).clone(),
            });
        }
    }

    progress.on_batch_complete(files_read, files_missing + files_skipped, total_files);

    if metrics.is_empty() {
        return Ok(ExtractSummary {
            census_rows,
            candidates: candidate_count,
            pool,
            files_read,
            files_missing,
            files_skipped,
            records: 0,
            metrics_path: None,
        });
    }

    metrics.sort_by(|a, b| b.dollar_volume.total_cmp(&a.dollar_volume));
    metrics.truncate(config.sample_size);
    export::write_metrics(&config.metrics_path, &metrics)?;

    Ok(ExtractSummary {
        census_rows,
        candidates: candidate_count,
        pool,
        files_read,
        files_missing,
        files_skipped,
        records: metrics.len(),
        metrics_path: Some(config.metrics_path.clone()),
    })
}

/// Day difference between the first days of the death and birth months.
/// Unparseable labels sort to the pool's tail with lifespan 0.
fn lifespan_days(record: &CensusRecord) -> i64 {
    match (
        record.birth_month.first_day(),
        record.death_month.first_day(),
    ) {
        (Some(birth), Some(death)) => (death - birth).num_days(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graveyard_core::domain::TickerStatus;

    fn record(ticker: &str, birth: &str, death: &str) -> CensusRecord {
        CensusRecord {
            ticker: ticker.into(),
            birth_month: MonthLabel::new(birth),
            death_month: MonthLabel::new(death),
            status: TickerStatus::Delisted,
            all_time_high: 100.0,
            all_time_low: 5.0,
            destruction_pct: Some(0.95),
        }
    }

    #[test]
    fn lifespan_is_day_difference_of_month_starts() {
        let r = record("AAA", "2020-01", "2020-03");
        assert_eq!(lifespan_days(&r), 60); // Jan 1 -> Mar 1, leap year
    }

    #[test]
    fn unparseable_labels_get_zero_lifespan() {
        let r = record("AAA", "garbage", "2020-03");
        assert_eq!(lifespan_days(&r), 0);
    }
}
