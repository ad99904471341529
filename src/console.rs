use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use project_ingest::processor::FolderOutcome;
use project_ingest::{ProgressReporter, RunSummary};
use std::sync::Mutex;

/// CLI progress reporter: one bar over the candidate folders.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_run_start(&self, folders: usize) {
        let pb = ProgressBar::new(folders as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} folders {msg}",
        ) {
            pb.set_style(
                style
                    .progress_chars("━╸─")
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
        }
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(pb);
        }
    }

    fn on_folder_start(&self, name: &str) {
        self.with_bar(|pb| pb.set_message(name.to_string()));
    }

    fn on_folder_complete(&self, outcome: &FolderOutcome) {
        let line = match outcome {
            FolderOutcome::Moved(report) => format!(
                "  {} {} -> {} [{}]",
                "✓".green(),
                report.original_name,
                report.final_name,
                report.flag
            ),
            FolderOutcome::Skipped { name, .. } => format!("  {} {} skipped", "-".yellow(), name),
            FolderOutcome::Failed { name, error } => {
                format!("  {} {}: {}", "✗".red(), name, error)
            }
        };
        self.with_bar(|pb| {
            pb.println(line);
            pb.inc(1);
        });
    }

    fn on_run_complete(&self, _summary: &RunSummary) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}
