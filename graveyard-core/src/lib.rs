//! Graveyard Core — domain types, snapshot data layer, census aggregation,
//! and death statistics.
//!
//! This crate contains the pure heart of the mortality pipeline:
//! - Domain types (month labels, lifecycles, census and metric rows)
//! - Monthly snapshot discovery and column-projected loads
//! - The lifecycle ledger the census pass folds files into
//! - Pure statistics over a dead ticker's final-month trace
//!
//! Job orchestration, configuration, and persistence live in
//! `graveyard-runner`.

pub mod census;
pub mod domain;
pub mod metrics;
pub mod snapshot;

pub use census::{destruction_pct, LifecycleLedger};
pub use domain::{CensusRecord, FailureMetricRecord, MonthLabel, TickerLifecycle, TickerStatus};
pub use metrics::DeathMetrics;
pub use snapshot::{DataError, MonthlyExtreme, MonthlyFile, SnapshotStore, TraceRow};
