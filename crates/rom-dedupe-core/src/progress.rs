use std::path::Path;

/// Trait for reporting apply/restore progress.
///
/// CLI implements with indicatif; tests and library callers use [`SilentReporter`].
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_apply_start(&self, _total_files: usize) {}
    fn on_file_removed(&self, _original: &Path, _staged: Option<&Path>) {}
    fn on_apply_complete(&self, _files: usize, _bytes: u64) {}
    fn on_restore_start(&self, _total_records: usize) {}
    fn on_file_restored(&self, _original: &Path) {}
    fn on_restore_complete(&self, _restored: usize, _unresolved: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
