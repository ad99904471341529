//! Naming conventions for project folders and the files inside them.

mod advisor;
mod file;
mod folder;

pub use advisor::{advise, disambiguate, ReservationPrefix};
pub use file::{is_reserved, split_extension, FileNameRules, FileVerdict};
pub use folder::{repair_folder_name, FolderNamePattern, NameVerdict, NamingFlag};

use crate::error::Error;
use regex::Regex;

/// Compiles `pattern` so it only matches a whole string, whatever anchors the
/// configured text carries.
pub(crate) fn compile_anchored(field: &'static str, pattern: &str) -> Result<Regex, Error> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| Error::Pattern {
        field,
        pattern: pattern.to_string(),
        source,
    })
}
