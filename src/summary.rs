use chrono::{DateTime, Local};
use indicatif::HumanDuration;
use std::time::{Duration, Instant};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::naming::NamingFlag;
use crate::processor::FolderOutcome;
use crate::storage::format_timestamp;

/// Counts, warnings and errors of one run.
///
/// Warnings cover expected outcomes an operator should look at (unrepairable
/// names, a locked spreadsheet). Errors are filesystem or log failures that
/// make the run exit non-zero.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub started_at: Option<DateTime<Local>>,
    pub duration: Duration,

    pub folders_found: usize,
    pub folders_moved: usize,
    pub folders_skipped: usize,
    pub folders_repaired: usize,
    pub folders_flagged: usize,
    pub folders_failed: usize,

    pub files_logged: usize,
    pub files_renamed: usize,
    pub files_unsupported: usize,
    pub files_reserved: usize,

    pub warnings: Vec<String>,
    pub errors: Vec<String>,

    start: Option<Instant>,
}

#[derive(Debug, Clone, Tabled)]
pub struct SummaryItem {
    #[tabled(rename = "Stat")]
    pub name: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl SummaryItem {
    fn new(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl RunSummary {
    pub fn start() -> Self {
        Self {
            started_at: Some(Local::now()),
            start: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn finish(&mut self) {
        if let Some(start) = self.start {
            self.duration = start.elapsed();
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn record(&mut self, outcome: &FolderOutcome) {
        match outcome {
            FolderOutcome::Moved(report) => {
                self.folders_moved += 1;
                if report.repaired {
                    self.folders_repaired += 1;
                }
                if report.flag == NamingFlag::X {
                    self.folders_flagged += 1;
                    self.warnings.push(format!(
                        "'{}' does not match the naming convention, moved as is and flagged X",
                        report.final_name
                    ));
                }

                self.files_logged += report.files_logged;
                self.files_renamed += report.files_renamed;
                self.files_unsupported += report.files_unsupported;
                self.files_reserved += report.files_reserved;

                if let Some(err) = &report.leftover_source {
                    self.errors.push(format!(
                        "'{}': {}; the destination copy is complete, remove the source by hand",
                        report.final_name, err
                    ));
                }
                if let Err(err) = &report.spreadsheet {
                    let msg = format!(
                        "'{}': {} spreadsheet rows not written ({}), reconcile manually",
                        report.final_name, report.files_logged, err
                    );
                    if err.is_lock() {
                        self.warnings.push(msg);
                    } else {
                        self.errors.push(msg);
                    }
                }
                if let Err(err) = &report.mapping {
                    self.errors.push(format!(
                        "'{}': mapping CSV not written ({})",
                        report.final_name, err
                    ));
                }
            }
            FolderOutcome::Skipped { .. } => self.folders_skipped += 1,
            FolderOutcome::Failed { name, error } => {
                self.folders_failed += 1;
                self.errors.push(format!("'{}': {}", name, error));
            }
        }
    }

    pub fn to_print_items(&self) -> Vec<SummaryItem> {
        let started = self
            .started_at
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_default();

        vec![
            SummaryItem::new("Started", started),
            SummaryItem::new("Duration", HumanDuration(self.duration)),
            SummaryItem::new("Folders Found", self.folders_found),
            SummaryItem::new("Folders Moved", self.folders_moved),
            SummaryItem::new("Folders Skipped", self.folders_skipped),
            SummaryItem::new("Folders Repaired", self.folders_repaired),
            SummaryItem::new("Folders Flagged X", self.folders_flagged),
            SummaryItem::new("Folders Failed", self.folders_failed),
            SummaryItem::new("Files Logged", self.files_logged),
            SummaryItem::new("Files Flagged RENAME_", self.files_renamed),
            SummaryItem::new("Files Flagged UNSUPPORTED_", self.files_unsupported),
            SummaryItem::new("Files Already Flagged", self.files_reserved),
            SummaryItem::new("Warnings", self.warnings.len()),
            SummaryItem::new("Errors", self.errors.len()),
        ]
    }

    pub fn table(&self) -> String {
        Table::new(self.to_print_items())
            .with(Style::rounded())
            .to_string()
    }
}
