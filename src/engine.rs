use std::fs;
use tracing::{debug, info};

use crate::config::IngestConfig;
use crate::error::Error;
use crate::processor::{FolderOutcome, FolderPlan, FolderProcessor};
use crate::progress::ProgressReporter;
use crate::scanner::{self, CandidateFolder};
use crate::storage::{LogWriter, MappingCsv, SpreadsheetLog, XlsxLog};
use crate::summary::RunSummary;

pub struct IngestEngine {
    config: IngestConfig,
    logs: LogWriter,
}

impl IngestEngine {
    pub fn new(config: IngestConfig) -> Self {
        let spreadsheet = Box::new(XlsxLog::new(&config.excel_log_path));
        let logs = LogWriter::new(
            spreadsheet,
            MappingCsv::new(&config.file_mapping_csv),
            config.retry,
        );
        Self { config, logs }
    }

    /// Replaces the workbook-backed spreadsheet log.
    pub fn with_spreadsheet(mut self, spreadsheet: Box<dyn SpreadsheetLog>) -> Self {
        self.logs = LogWriter::new(
            spreadsheet,
            MappingCsv::new(&self.config.file_mapping_csv),
            self.config.retry,
        );
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Processes every folder currently in the source directory, one at a
    /// time. Only an unreadable source or destination aborts the run; folder
    /// level failures are collected in the summary.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<RunSummary, Error> {
        let mut summary = RunSummary::start();

        info!(
            "Ingesting {} -> {}",
            self.config.source_dir.display(),
            self.config.destination_dir.display()
        );
        fs::create_dir_all(&self.config.destination_dir)
            .map_err(|err| Error::fs("create", &self.config.destination_dir, err))?;

        let candidates = self.candidates()?;
        summary.folders_found = candidates.len();
        if candidates.is_empty() {
            info!("No subfolders found in source directory");
        } else {
            info!("Found {} subfolders to process", candidates.len());
        }

        let logged = self.logs.logged_folders();
        let processor = FolderProcessor::new(&self.config, &self.logs, &logged);

        reporter.on_run_start(candidates.len());
        for candidate in &candidates {
            reporter.on_folder_start(&candidate.name);
            let outcome = processor.process(candidate);
            if let FolderOutcome::Moved(report) = &outcome {
                debug!(
                    "'{}' -> '{}' ({}), {} logged",
                    report.original_name, report.final_name, report.flag, report.files_logged
                );
            }
            summary.record(&outcome);
            reporter.on_folder_complete(&outcome);
        }

        summary.finish();
        reporter.on_run_complete(&summary);
        Ok(summary)
    }

    /// Plans every candidate folder without touching the file system.
    pub fn preview(&self) -> Result<Vec<FolderPlan>, Error> {
        let candidates = self.candidates()?;
        let logged = self.logs.logged_folders();
        let processor = FolderProcessor::new(&self.config, &self.logs, &logged);

        candidates
            .iter()
            .map(|candidate| processor.plan(candidate))
            .collect()
    }

    fn candidates(&self) -> Result<Vec<CandidateFolder>, Error> {
        Ok(scanner::list_candidate_folders(
            &self.config.source_dir,
            &[self.config.destination_dir.as_path()],
        )?)
    }
}
