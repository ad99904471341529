use crate::processor::FolderOutcome;
use crate::summary::RunSummary;

/// Trait for reporting run progress.
///
/// The CLI implements it with indicatif; library callers and tests use
/// [`SilentReporter`]. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_run_start(&self, _folders: usize) {}
    fn on_folder_start(&self, _name: &str) {}
    fn on_folder_complete(&self, _outcome: &FolderOutcome) {}
    fn on_run_complete(&self, _summary: &RunSummary) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
