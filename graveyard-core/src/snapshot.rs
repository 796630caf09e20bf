//! Monthly snapshot store — discovery and column-projected loads.
//!
//! Snapshot files live flat in one data directory, one per calendar month,
//! named `ohlcv_<YYYY-MM>.parquet` (or `.csv`). Loads are lazy scans that
//! project only the columns a pass needs, so peak memory stays at one
//! file's worth of selected columns.

use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::MonthLabel;

/// Snapshot file-name prefix; the month label sits between this and the
/// format extension.
pub const FILE_PREFIX: &str = "ohlcv_";

pub const COL_TICKER: &str = "ticker";
pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_CLOSE: &str = "close";
pub const COL_VOLUME: &str = "volume";

/// Structured error types for snapshot access.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("data directory error: {0}")]
    DataDir(String),

    #[error("snapshot read error: {0}")]
    Read(String),

    #[error("unsupported snapshot format: {0}")]
    UnsupportedFormat(String),
}

/// A discovered monthly snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyFile {
    pub month: MonthLabel,
    pub path: PathBuf,
}

/// Per-file per-ticker close-price extremes (the census pass's only view
/// of a snapshot).
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyExtreme {
    pub ticker: String,
    pub high: f64,
    pub low: f64,
}

/// One row of a single ticker's trace within a snapshot file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceRow {
    pub timestamp: i64,
    pub close: f64,
    pub volume: f64,
}

/// Access to the directory of monthly snapshot files.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// List all monthly snapshot files, sorted by month label (equals
    /// chronological order). Non-snapshot files are ignored.
    pub fn discover(&self) -> Result<Vec<MonthlyFile>, DataError> {
        let entries = fs::read_dir(&self.data_dir)
            .map_err(|e| DataError::DataDir(format!("{}: {e}", self.data_dir.display())))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::DataDir(e.to_string()))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(month) = parse_month_label(name) {
                files.push(MonthlyFile {
                    month,
                    path: entry.path(),
                });
            }
        }

        files.sort_by(|a, b| (&a.month, &a.path).cmp(&(&b.month, &b.path)));
        Ok(files)
    }

    /// Resolve a month label to its snapshot file, preferring parquet over
    /// CSV. `None` if neither exists.
    pub fn resolve(&self, month: &MonthLabel) -> Option<MonthlyFile> {
        for ext in ["parquet", "csv"] {
            let path = self.data_dir.join(format!("{FILE_PREFIX}{month}.{ext}"));
            if path.is_file() {
                return Some(MonthlyFile {
                    month: month.clone(),
                    path,
                });
            }
        }
        None
    }

    /// Load per-ticker close extremes for one file.
    ///
    /// Projects only the ticker and close columns, then aggregates min/max
    /// close per ticker inside the scan.
    pub fn load_monthly_extremes(
        &self,
        file: &MonthlyFile,
    ) -> Result<Vec<MonthlyExtreme>, DataError> {
        let df = scan_snapshot(&file.path)?
            .select([col(COL_TICKER), col(COL_CLOSE).cast(DataType::Float64)])
            .group_by([col(COL_TICKER)])
            .agg([
                col(COL_CLOSE).min().alias("low"),
                col(COL_CLOSE).max().alias("high"),
            ])
            .collect()
            .map_err(|e| DataError::Read(format!("{}: {e}", file.path.display())))?;

        let tickers = str_column(&df, COL_TICKER)?;
        let lows = f64_column(&df, "low")?;
        let highs = f64_column(&df, "high")?;

        let mut extremes = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            // An all-null group contributes nothing.
            let (Some(ticker), Some(low), Some(high)) =
                (tickers.get(i), lows.get(i), highs.get(i))
            else {
                continue;
            };
            extremes.push(MonthlyExtreme {
                ticker: ticker.to_string(),
                high,
                low,
            });
        }
        Ok(extremes)
    }

    /// Load the time-sorted traces of the requested tickers from one file.
    ///
    /// Projects only ticker/timestamp/close/volume. Tickers absent from the
    /// file simply have no entry in the result.
    pub fn load_death_traces(
        &self,
        file: &MonthlyFile,
        tickers: &[String],
    ) -> Result<BTreeMap<String, Vec<TraceRow>>, DataError> {
        let df = scan_snapshot(&file.path)?
            .select([
                col(COL_TICKER),
                col(COL_TIMESTAMP).cast(DataType::Int64),
                col(COL_CLOSE).cast(DataType::Float64),
                col(COL_VOLUME).cast(DataType::Float64),
            ])
            .collect()
            .map_err(|e| DataError::Read(format!("{}: {e}", file.path.display())))?;

        let wanted: BTreeSet<&str> = tickers.iter().map(|t| t.as_str()).collect();

        let ticker_col = str_column(&df, COL_TICKER)?;
        let ts_col = i64_column(&df, COL_TIMESTAMP)?;
        let close_col = f64_column(&df, COL_CLOSE)?;
        let volume_col = f64_column(&df, COL_VOLUME)?;

        let mut traces: BTreeMap<String, Vec<TraceRow>> = BTreeMap::new();
        for i in 0..df.height() {
            let Some(ticker) = ticker_col.get(i) else { continue };
            if !wanted.contains(ticker) {
                continue;
            }
            // Rows without a timestamp or close cannot be ordered or priced.
            let (Some(timestamp), Some(close)) = (ts_col.get(i), close_col.get(i)) else {
                continue;
            };
            traces.entry(ticker.to_string()).or_default().push(TraceRow {
                timestamp,
                close,
                volume: volume_col.get(i).unwrap_or(0.0),
            });
        }

        for rows in traces.values_mut() {
            rows.sort_by_key(|r| r.timestamp);
        }
        Ok(traces)
    }
}

/// Open one snapshot as a lazy frame, dispatching on the file extension.
fn scan_snapshot(path: &Path) -> Result<LazyFrame, DataError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => LazyFrame::scan_parquet(path, Default::default())
            .map_err(|e| DataError::Read(format!("{}: {e}", path.display()))),
        Some("csv") => LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()
            .map_err(|e| DataError::Read(format!("{}: {e}", path.display()))),
        _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Extract the month label from a snapshot file name, or `None` if the
/// name does not match `ohlcv_<label>.{parquet,csv}`.
pub fn parse_month_label(file_name: &str) -> Option<MonthLabel> {
    let rest = file_name.strip_prefix(FILE_PREFIX)?;
    let label = rest
        .strip_suffix(".parquet")
        .or_else(|| rest.strip_suffix(".csv"))?;
    if label.is_empty() {
        return None;
    }
    Some(MonthLabel::new(label))
}

// ─── Column accessors ───────────────────────────────────────────────

fn str_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked, DataError> {
    df.column(name)
        .and_then(|c| c.str())
        .map_err(|e| DataError::Read(format!("column {name}: {e}")))
}

fn f64_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Float64Chunked, DataError> {
    df.column(name)
        .and_then(|c| c.f64())
        .map_err(|e| DataError::Read(format!("column {name}: {e}")))
}

fn i64_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Int64Chunked, DataError> {
    df.column(name)
        .and_then(|c| c.i64())
        .map_err(|e| DataError::Read(format!("column {name}: {e}")))
}
