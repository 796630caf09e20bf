//! Domain types — month labels, ticker lifecycles, census and metric rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Month label embedded in snapshot file names (`YYYY-MM`).
///
/// Lexicographic order on the label equals chronological order, so the
/// derived `Ord` is the scan order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthLabel(String);

impl MonthLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First calendar day of the month, or `None` if the label is not a
    /// parseable `YYYY-MM`.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&format!("{}-01", self.0), "%Y-%m-%d").ok()
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MonthLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// Alive/dead classification of a ticker at census time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickerStatus {
    Alive,
    #[serde(rename = "Dead/Delisted")]
    Delisted,
}

impl TickerStatus {
    /// A ticker is alive iff it was still seen at or after the cutoff month.
    pub fn classify(death_month: &MonthLabel, cutoff: &MonthLabel) -> Self {
        if death_month >= cutoff {
            Self::Alive
        } else {
            Self::Delisted
        }
    }

    pub fn is_delisted(self) -> bool {
        matches!(self, Self::Delisted)
    }
}

impl fmt::Display for TickerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alive => f.write_str("Alive"),
            Self::Delisted => f.write_str("Dead/Delisted"),
        }
    }
}

/// Running lifecycle of one ticker across the chronological scan.
///
/// Created on the first sighting and mutated in place on every later one;
/// never deleted. Under sorted scan order `birth_month <= death_month` and
/// `all_time_low <= all_time_high` hold throughout.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerLifecycle {
    pub birth_month: MonthLabel,
    pub death_month: MonthLabel,
    pub all_time_high: f64,
    pub all_time_low: f64,
}

impl TickerLifecycle {
    /// Lifecycle for a ticker first seen in `month` with the given
    /// within-month close extremes.
    pub fn first_sighting(month: &MonthLabel, high: f64, low: f64) -> Self {
        Self {
            birth_month: month.clone(),
            death_month: month.clone(),
            all_time_high: high,
            all_time_low: low,
        }
    }

    /// Fold a later month's extremes into the record. The death month
    /// advances monotonically because files are scanned in sorted order.
    pub fn observe(&mut self, month: &MonthLabel, high: f64, low: f64) {
        self.death_month = month.clone();
        if high > self.all_time_high {
            self.all_time_high = high;
        }
        if low < self.all_time_low {
            self.all_time_low = low;
        }
    }
}

/// One row of the persisted census table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CensusRecord {
    pub ticker: String,
    pub birth_month: MonthLabel,
    pub death_month: MonthLabel,
    pub status: TickerStatus,
    pub all_time_high: f64,
    pub all_time_low: f64,
    /// `(high - low) / high`; only present for delisted rows with a
    /// positive all-time high. Serializes to an empty CSV field otherwise.
    pub destruction_pct: Option<f64>,
}

/// One row of the final failure-metrics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureMetricRecord {
    pub ticker: String,
    pub dollar_volume: f64,
    pub exodus_ratio: f64,
    pub volatility: f64,
    pub final_drop_pct: f64,
    pub death_date: MonthLabel,
}
