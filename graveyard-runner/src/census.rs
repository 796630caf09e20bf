//! Census job — one chronological scan over the snapshot directory.
//!
//! Folds every monthly file into the lifecycle ledger, checkpointing the
//! full table every `checkpoint_every` files, then writes the final census
//! and its run-summary sidecar. Unreadable files are skipped with a
//! warning; an empty directory produces an empty (header-only) table.

use graveyard_core::census::LifecycleLedger;
use graveyard_core::domain::TickerStatus;
use graveyard_core::snapshot::{DataError, SnapshotStore};
use std::path::PathBuf;

use crate::config::CensusConfig;
use crate::export::{self, CensusMeta, ExportError};
use crate::progress::ScanProgress;

#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Counts reported after a census run.
#[derive(Debug, Clone)]
pub struct CensusSummary {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub total_tickers: usize,
    pub alive: usize,
    pub dead: usize,
    pub census_path: PathBuf,
}

/// Run the census scan to completion and persist the table.
///
/// The checkpoint is a crash-inspection aid only; it is overwritten each
/// interval and never read back by the pipeline.
pub fn run_census(
    config: &CensusConfig,
    progress: &dyn ScanProgress,
) -> Result<CensusSummary, CensusError> {
    let store = SnapshotStore::new(&config.data_dir);
    let files = store.discover()?;
    let total = files.len();

    let mut ledger = LifecycleLedger::new();
    let mut skipped = 0usize;

    for (i, file) in files.iter().enumerate() {
        progress.on_file_start(file.month.as_str(), i, total);

        // One file's aggregates live only within this iteration; the
        // ledger is the sole state carried across files.
        match store.load_monthly_extremes(file) {
            Ok(extremes) => ledger.observe_month(&file.month, &extremes),
            Err(e) => {
                skipped += 1;
                progress.on_file_skipped(file.month.as_str(), &e);
            }
        }

        if config.checkpoint_every > 0 && (i + 1) % config.checkpoint_every == 0 {
            let checkpoint = config.checkpoint_path();
            export::write_census(&checkpoint, &ledger.to_records(&config.cutoff_month))?;
            progress.on_checkpoint(i + 1, &checkpoint);
        }
    }

    progress.on_batch_complete(total - skipped, skipped, total);

    let records = ledger.to_records(&config.cutoff_month);
    export::write_census(&config.census_path, &records)?;

    let alive = records
        .iter()
        .filter(|r| r.status == TickerStatus::Alive)
        .count();
    let dead = records.len() - alive;

    let meta = CensusMeta {
        cutoff_month: config.cutoff_month.clone(),
        files_scanned: total - skipped,
        files_skipped: skipped,
        total_tickers: records.len(),
        alive,
        dead,
        written_at: chrono::Local::now().naive_local(),
    };
    export::write_census_meta(&config.meta_path(), &meta)?;

    Ok(CensusSummary {
        files_scanned: total - skipped,
        files_skipped: skipped,
        total_tickers: records.len(),
        alive,
        dead,
        census_path: config.census_path.clone(),
    })
}
