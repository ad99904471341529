//! The two durable audit logs: the spreadsheet processing log and the CSV
//! file mapping.

mod csv_log;
pub mod models;
mod retry;
mod spreadsheet;

pub use csv_log::MappingCsv;
pub use models::{format_timestamp, LogRow, MappingRow, LOG_HEADERS};
pub use retry::RetryPolicy;
pub use spreadsheet::{SpreadsheetLog, XlsxLog, SHEET_NAME};

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

use crate::platform;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{} still locked after {attempts} attempts", .path.display())]
    Locked { path: PathBuf, attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Could not read workbook: {0}")]
    Read(calamine::XlsxError),

    #[error("Could not write workbook: {0}")]
    Write(rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl StorageError {
    /// Failure caused by another process holding the file.
    pub fn is_lock(&self) -> bool {
        match self {
            StorageError::Locked { .. } => true,
            StorageError::Io(err) => platform::is_lock_error(err),
            _ => false,
        }
    }
}

/// Result of logging one folder. The two logs succeed or fail independently.
#[derive(Debug)]
pub struct LogReport {
    pub spreadsheet: Result<(), StorageError>,
    pub mapping: Result<(), StorageError>,
}

pub struct LogWriter {
    spreadsheet: Box<dyn SpreadsheetLog>,
    mapping: MappingCsv,
    retry: RetryPolicy,
}

impl LogWriter {
    pub fn new(
        spreadsheet: Box<dyn SpreadsheetLog>,
        mapping: MappingCsv,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            spreadsheet,
            mapping,
            retry,
        }
    }

    /// Folder names already recorded in the spreadsheet. An unreadable log is
    /// reported and treated as empty; the destination check still guards
    /// against reprocessing.
    pub fn logged_folders(&self) -> HashSet<String> {
        match self
            .retry
            .run(self.spreadsheet.path(), || self.spreadsheet.logged_folders())
        {
            Ok(folders) => {
                info!("Found {} already processed folders in log", folders.len());
                folders
            }
            Err(err) => {
                warn!("Could not read existing log: {}", err);
                HashSet::new()
            }
        }
    }

    pub fn append(&self, rows: &[LogRow], mappings: &[MappingRow]) -> LogReport {
        let mapping = self.mapping.append(mappings);

        let spreadsheet = if rows.is_empty() {
            Ok(())
        } else {
            self.retry
                .run(self.spreadsheet.path(), || self.spreadsheet.append(rows))
        };

        LogReport {
            spreadsheet,
            mapping,
        }
    }
}
