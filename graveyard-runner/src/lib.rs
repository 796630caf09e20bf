//! Graveyard Runner — the census and extraction batch jobs.
//!
//! This crate builds on `graveyard-core` to provide:
//! - The census scan (discover, fold, checkpoint, persist, summarize)
//! - The failure extraction (filter, pool, batch by death file, rank)
//! - TOML pipeline configuration with CLI-overridable defaults
//! - Progress reporting and CSV/JSON persistence

pub mod census;
pub mod config;
pub mod export;
pub mod extract;
pub mod progress;

pub use census::{run_census, CensusError, CensusSummary};
pub use config::{CensusConfig, ConfigError, ExtractConfig, PipelineConfig};
pub use export::{
    read_census, write_census, write_census_meta, write_metrics, CensusMeta, ExportError,
};
pub use extract::{run_extraction, ExtractError, ExtractSummary};
pub use progress::{ScanProgress, SilentProgress, StdoutProgress};
