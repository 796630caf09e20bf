//! Table persistence — census and metrics CSVs, plus the census
//! run-summary JSON sidecar.
//!
//! The census CSV is the contract between the two jobs: the extraction
//! trusts it, so a malformed table (missing columns) surfaces as a hard
//! error on read rather than being repaired.

use graveyard_core::domain::{CensusRecord, FailureMetricRecord, MonthLabel};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Column order of the census table.
pub const CENSUS_HEADER: [&str; 7] = [
    "ticker",
    "birth_month",
    "death_month",
    "status",
    "all_time_high",
    "all_time_low",
    "destruction_pct",
];

/// Column order of the failure-metrics table.
pub const METRICS_HEADER: [&str; 6] = [
    "ticker",
    "dollar_volume",
    "exodus_ratio",
    "volatility",
    "final_drop_pct",
    "death_date",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write the census table. An empty record set still writes the header
/// row, so an empty dataset yields an empty-but-well-formed table.
pub fn write_census(path: &Path, records: &[CensusRecord]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    if records.is_empty() {
        wtr.write_record(CENSUS_HEADER)?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read the census table back. Missing expected columns fail here.
pub fn read_census(path: &Path) -> Result<Vec<CensusRecord>, ExportError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

/// Write the ranked failure-metrics table.
pub fn write_metrics(path: &Path, records: &[FailureMetricRecord]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    if records.is_empty() {
        wtr.write_record(METRICS_HEADER)?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Run-summary sidecar written next to the census table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CensusMeta {
    pub cutoff_month: MonthLabel,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub total_tickers: usize,
    pub alive: usize,
    pub dead: usize,
    pub written_at: chrono::NaiveDateTime,
}

/// Write the census run-summary sidecar.
pub fn write_census_meta(path: &Path, meta: &CensusMeta) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(meta)?;
    std::fs::write(path, json)?;
    Ok(())
}
