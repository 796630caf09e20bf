//! Serializable pipeline configuration.
//!
//! One TOML file with `[census]` and `[extract]` sections; every field has
//! a default so a missing file, section, or key falls back to the stock
//! pipeline. CLI flags override on top of this.

use graveyard_core::domain::MonthLabel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the census scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CensusConfig {
    /// Directory of monthly snapshot files.
    pub data_dir: PathBuf,

    /// Where the census table is written.
    pub census_path: PathBuf,

    /// Tickers last seen before this month are classified Dead/Delisted.
    pub cutoff_month: MonthLabel,

    /// Write a full checkpoint every this many files; 0 disables
    /// checkpointing.
    pub checkpoint_every: usize,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            census_path: PathBuf::from("graveyard_index.csv"),
            cutoff_month: MonthLabel::new("2024-06"),
            checkpoint_every: 25,
        }
    }
}

impl CensusConfig {
    /// The checkpoint sits next to the census file and is fully
    /// overwritten on every checkpoint interval.
    pub fn checkpoint_path(&self) -> PathBuf {
        let mut name = self.census_path.clone().into_os_string();
        name.push(".checkpoint");
        PathBuf::from(name)
    }

    /// The run-summary sidecar written next to the census file.
    pub fn meta_path(&self) -> PathBuf {
        let mut name = self.census_path.clone().into_os_string();
        name.push(".meta.json");
        PathBuf::from(name)
    }
}

/// Configuration for the failure extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Directory of monthly snapshot files.
    pub data_dir: PathBuf,

    /// The census table produced by the census scan.
    pub census_path: PathBuf,

    /// Where the ranked failure-metrics table is written.
    pub metrics_path: PathBuf,

    /// Minimum destruction percentage for a dead ticker to qualify.
    pub min_destruction: f64,

    /// Cap on the final ranked output.
    pub sample_size: usize,

    /// Cap on the lifespan-ranked candidate pool; bounds how many
    /// snapshot files the extraction re-opens.
    pub search_pool: usize,

    /// Minimum row count of a death-month trace (liquidity floor).
    pub min_trace_rows: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            census_path: PathBuf::from("graveyard_index.csv"),
            metrics_path: PathBuf::from("death_metrics.csv"),
            min_destruction: 0.80,
            sample_size: 1000,
            search_pool: 5000,
            min_trace_rows: 60,
        }
    }
}

/// Both jobs' configuration, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub census: CensusConfig,
    pub extract: ExtractConfig,
}

impl PipelineConfig {
    /// Load a pipeline config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a pipeline config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_pipeline() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.census.cutoff_month, MonthLabel::new("2024-06"));
        assert_eq!(cfg.census.checkpoint_every, 25);
        assert_eq!(cfg.extract.min_destruction, 0.80);
        assert_eq!(cfg.extract.sample_size, 1000);
        assert_eq!(cfg.extract.search_pool, 5000);
        assert_eq!(cfg.extract.min_trace_rows, 60);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg = PipelineConfig::from_toml("").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let cfg = PipelineConfig::from_toml(
            r#"
[census]
data_dir = "/mnt/snapshots"
cutoff_month = "2025-01"

[extract]
min_destruction = 0.95
"#,
        )
        .unwrap();

        assert_eq!(cfg.census.data_dir, PathBuf::from("/mnt/snapshots"));
        assert_eq!(cfg.census.cutoff_month, MonthLabel::new("2025-01"));
        assert_eq!(cfg.census.checkpoint_every, 25);
        assert_eq!(cfg.extract.min_destruction, 0.95);
        assert_eq!(cfg.extract.sample_size, 1000);
    }

    #[test]
    fn checkpoint_and_meta_paths_derive_from_census_path() {
        let cfg = CensusConfig {
            census_path: PathBuf::from("out/graveyard_index.csv"),
            ..Default::default()
        };
        assert_eq!(
            cfg.checkpoint_path(),
            PathBuf::from("out/graveyard_index.csv.checkpoint")
        );
        assert_eq!(
            cfg.meta_path(),
            PathBuf::from("out/graveyard_index.csv.meta.json")
        );
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = PipelineConfig::default();
        let toml_str = toml::to_string(&cfg).unwrap();
        let parsed = PipelineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(cfg, parsed);
    }
}
