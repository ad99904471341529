use chrono::Local;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::IngestConfig;
use crate::error::Error;
use crate::mover::{self, Relocation};
use crate::naming::{self, FileVerdict, NameVerdict, NamingFlag};
use crate::scanner::{self, CandidateFolder, FileRecord};
use crate::storage::{format_timestamp, LogRow, LogWriter, MappingRow, StorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The destination already holds a folder with the final name.
    InDestination(PathBuf),
    /// The final name is already recorded in the spreadsheet log.
    AlreadyLogged,
}

#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub record: FileRecord,
    /// `None` for files that already carry a reservation prefix.
    pub verdict: Option<FileVerdict>,
}

/// Read-only decision for one folder. Building a plan touches nothing.
#[derive(Debug, Clone)]
pub struct FolderPlan {
    pub candidate: CandidateFolder,
    pub verdict: NameVerdict,
    pub destination: PathBuf,
    pub skip: Option<SkipReason>,
    pub files: Vec<PlannedFile>,
}

#[derive(Debug)]
pub struct FolderReport {
    pub original_name: String,
    pub final_name: String,
    pub flag: NamingFlag,
    pub repaired: bool,
    pub destination: PathBuf,
    pub files_logged: usize,
    pub files_renamed: usize,
    pub files_unsupported: usize,
    pub files_reserved: usize,
    /// Set when a cross-volume move could not remove the source folder.
    pub leftover_source: Option<Error>,
    pub spreadsheet: Result<(), StorageError>,
    pub mapping: Result<(), StorageError>,
}

#[derive(Debug)]
pub enum FolderOutcome {
    Moved(FolderReport),
    Skipped { name: String, reason: SkipReason },
    Failed { name: String, error: Error },
}

/// Runs one candidate folder from discovery to a terminal state. Per-folder
/// errors end up in [`FolderOutcome::Failed`] and never escape.
pub struct FolderProcessor<'a> {
    config: &'a IngestConfig,
    logs: &'a LogWriter,
    logged: &'a HashSet<String>,
}

impl<'a> FolderProcessor<'a> {
    pub fn new(config: &'a IngestConfig, logs: &'a LogWriter, logged: &'a HashSet<String>) -> Self {
        Self {
            config,
            logs,
            logged,
        }
    }

    pub fn plan(&self, candidate: &CandidateFolder) -> Result<FolderPlan, Error> {
        let verdict = self.config.folder_pattern.validate(&candidate.name);
        let destination = self.config.destination_dir.join(verdict.final_name());

        let skip = if destination.exists() {
            Some(SkipReason::InDestination(destination.clone()))
        } else if self.logged.contains(verdict.final_name()) {
            Some(SkipReason::AlreadyLogged)
        } else {
            None
        };

        let files = match skip {
            Some(_) => Vec::new(),
            None => scanner::walk_files(&candidate.path)
                .map_err(|err| Error::fs("scan", &candidate.path, err))?
                .into_iter()
                .map(|record| PlannedFile {
                    verdict: self.config.file_rules.validate(&record.file_name),
                    record,
                })
                .collect(),
        };

        Ok(FolderPlan {
            candidate: candidate.clone(),
            verdict,
            destination,
            skip,
            files,
        })
    }

    pub fn process(&self, candidate: &CandidateFolder) -> FolderOutcome {
        let plan = match self.plan(candidate) {
            Ok(plan) => plan,
            Err(error) => {
                error!("Could not scan '{}': {}", candidate.name, error);
                return FolderOutcome::Failed {
                    name: candidate.name.clone(),
                    error,
                };
            }
        };

        if let Some(reason) = &plan.skip {
            match reason {
                SkipReason::InDestination(path) => info!(
                    "Skipping '{}' - {} already exists",
                    candidate.name,
                    path.display()
                ),
                SkipReason::AlreadyLogged => {
                    info!("Skipping '{}' - already processed", candidate.name)
                }
            }
            return FolderOutcome::Skipped {
                name: candidate.name.clone(),
                reason: reason.clone(),
            };
        }

        match self.execute(plan) {
            Ok(report) => FolderOutcome::Moved(report),
            Err(error) => {
                error!("Could not process '{}': {}", candidate.name, error);
                FolderOutcome::Failed {
                    name: candidate.name.clone(),
                    error,
                }
            }
        }
    }

    fn execute(&self, plan: FolderPlan) -> Result<FolderReport, Error> {
        let FolderPlan {
            candidate,
            verdict,
            destination,
            files,
            ..
        } = plan;

        match &verdict {
            NameVerdict::Valid(_) => info!("Processing '{}': name OK", candidate.name),
            NameVerdict::Repaired { repaired, .. } => {
                info!("Processing '{}': name repaired to '{}'", candidate.name, repaired)
            }
            NameVerdict::Unrepairable(_) => warn!(
                "Processing '{}': name does not match convention, flagged X",
                candidate.name
            ),
        }

        let mut applied: Vec<(PathBuf, PathBuf)> = Vec::new();
        let mut valid: Vec<FileRecord> = Vec::new();
        let mut files_renamed = 0;
        let mut files_unsupported = 0;
        let mut files_reserved = 0;

        for file in files {
            let file_verdict = match file.verdict {
                None => {
                    debug!("Leaving reserved file {}", file.record.relative_path.display());
                    files_reserved += 1;
                    continue;
                }
                Some(FileVerdict::Valid) => {
                    valid.push(file.record);
                    continue;
                }
                Some(file_verdict) => file_verdict,
            };

            let Some(target) = naming::advise(&file.record.file_name, file_verdict) else {
                continue;
            };
            match mover::rename_file(&file.record.path, &target, &Local::now()) {
                Ok(new_path) => {
                    warn!(
                        "  {} flagged as {:?}, renamed to {}",
                        file.record.relative_path.display(),
                        file_verdict,
                        display_name(&new_path)
                    );
                    match file_verdict {
                        FileVerdict::UnsupportedExtension => files_unsupported += 1,
                        _ => files_renamed += 1,
                    }
                    applied.push((file.record.path, new_path));
                }
                Err(err) => {
                    revert_renames(&applied);
                    return Err(err);
                }
            }
        }

        let leftover_source = match mover::move_folder(&candidate.path, &destination) {
            Ok(Relocation::SourceLeftBehind(err)) => Some(err),
            Ok(_) => None,
            Err(err) => {
                revert_renames(&applied);
                return Err(err);
            }
        };
        info!("  Moved to {}", destination.display());

        let flag = verdict.flag();
        let final_name = verdict.final_name().to_string();
        let processed = Local::now();
        let processed_str = format_timestamp(&processed);

        let rows: Vec<LogRow> = valid
            .iter()
            .map(|record| LogRow {
                folder_name: final_name.clone(),
                naming_flag: flag,
                processed_date: processed,
                file_name: record.file_name.clone(),
                file_path: record.relative_path.to_string_lossy().into_owned(),
                file_created_date: record.created,
            })
            .collect();

        let mappings: Vec<MappingRow> = valid
            .iter()
            .map(|record| MappingRow {
                original_path: record.path.to_string_lossy().into_owned(),
                new_path: destination
                    .join(&record.relative_path)
                    .to_string_lossy()
                    .into_owned(),
                folder: final_name.clone(),
                processed_date: processed_str.clone(),
                naming_flag: flag,
            })
            .collect();

        let report = self.logs.append(&rows, &mappings);
        match &report.spreadsheet {
            Ok(()) => info!("  Logged {} files", rows.len()),
            Err(err) if err.is_lock() => warn!("  Spreadsheet rows dropped: {}", err),
            Err(err) => error!("  Spreadsheet write failed: {}", err),
        }
        if let Err(err) = &report.mapping {
            error!("  Mapping CSV write failed: {}", err);
        }

        Ok(FolderReport {
            original_name: candidate.name,
            repaired: matches!(verdict, NameVerdict::Repaired { .. }),
            final_name,
            flag,
            destination,
            files_logged: rows.len(),
            files_renamed,
            files_unsupported,
            files_reserved,
            leftover_source,
            spreadsheet: report.spreadsheet,
            mapping: report.mapping,
        })
    }
}

/// Undoes in-place renames, newest first, so a folder that could not be moved
/// is left as it was found.
fn revert_renames(applied: &[(PathBuf, PathBuf)]) {
    for (original, renamed) in applied.iter().rev() {
        if let Err(err) = fs::rename(renamed, original) {
            error!(
                "Could not restore {} to {}: {}",
                renamed.display(),
                display_name(original),
                err
            );
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
