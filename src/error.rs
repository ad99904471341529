use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid {field} '{pattern}': {source}")]
    Pattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("Failed to {op} {}: {source}", .path.display())]
    FileSystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Copied to destination but could not remove source {}: {source}", .path.display())]
    SourceNotRemoved {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No free name left for {}", .0.display())]
    RenameExhausted(PathBuf),

    #[error("Log error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    pub(crate) fn fs(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::FileSystem {
            op,
            path: path.into(),
            source,
        }
    }
}
