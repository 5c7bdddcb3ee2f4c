use std::path::Path;

/// Trait for reporting pass progress.
///
/// The CLI implements it with an indicatif spinner; tests use [`SilentReporter`].
/// All methods have default no-op implementations.
pub trait ProgressReporter {
    fn on_folder_start(&self, _name: &str, _path: &Path) {}
    fn on_file_start(&self, _path: &Path) {}
    fn on_file_done(&self, _from: &Path, _to: &Path, _dry_run: bool) {}
    fn on_file_failed(&self, _path: &Path, _error: &str) {}
    fn on_folder_complete(&self, _name: &str) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
