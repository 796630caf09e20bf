//! Progress callbacks for the file-by-file batch loops.

use graveyard_core::snapshot::DataError;
use std::path::Path;

/// Progress sink for a sequential multi-file scan.
///
/// Both jobs drive this once per file; checkpoint notifications only come
/// from the census scan.
pub trait ScanProgress: Send {
    /// Called before a file is opened.
    fn on_file_start(&self, label: &str, index: usize, total: usize);

    /// Called when a file could not be read and was skipped.
    fn on_file_skipped(&self, label: &str, error: &DataError);

    /// Called after a checkpoint write.
    fn on_checkpoint(&self, files_done: usize, path: &Path);

    /// Called when the whole batch is done.
    fn on_batch_complete(&self, processed: usize, skipped: usize, total: usize);
}

/// Progress reporter that prints to stdout/stderr.
pub struct StdoutProgress;

impl ScanProgress for StdoutProgress {
    fn on_file_start(&self, label: &str, index: usize, total: usize) {
        println!("[{}/{}] Scanning {label}...", index + 1, total);
    }

    fn on_file_skipped(&self, label: &str, error: &DataError) {
        eprintln!("WARNING: skipping {label}: {error}");
    }

    fn on_checkpoint(&self, files_done: usize, path: &Path) {
        println!("  checkpoint after {files_done} files -> {}", path.display());
    }

    fn on_batch_complete(&self, processed: usize, skipped: usize, total: usize) {
        println!("\nScan complete: {processed}/{total} files processed, {skipped} skipped");
    }
}

/// No-op progress sink.
pub struct SilentProgress;

impl ScanProgress for SilentProgress {
    fn on_file_start(&self, _label: &str, _index: usize, _total: usize) {}
    fn on_file_skipped(&self, _label: &str, _error: &DataError) {}
    fn on_checkpoint(&self, _files_done: usize, _path: &Path) {}
    fn on_batch_complete(&self, _processed: usize, _skipped: usize, _total: usize) {}
}
