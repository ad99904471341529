use regex::Regex;
use std::collections::BTreeSet;

use super::advisor::ReservationPrefix;
use super::compile_anchored;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileVerdict {
    Valid,
    InvalidStructure,
    UnsupportedExtension,
}

/// True when the name already carries a reservation prefix. Such files were
/// flagged by an earlier run and are never looked at again.
pub fn is_reserved(file_name: &str) -> bool {
    ReservationPrefix::ALL
        .iter()
        .any(|prefix| file_name.starts_with(prefix.as_str()))
}

/// Splits at the final dot. A name without a dot has no extension.
pub fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(idx) => (&file_name[..idx], Some(&file_name[idx + 1..])),
        None => (file_name, None),
    }
}

/// Compiled file naming convention plus the set of accepted extensions.
///
/// The pattern is matched against the stem (the name without its extension).
/// If it defines a `date` capture group, the captured text must also be a
/// plausible `YYMMDD` date.
#[derive(Debug, Clone)]
pub struct FileNameRules {
    pattern: Regex,
    source: String,
    extensions: BTreeSet<String>,
}

impl FileNameRules {
    pub fn new<I, S>(pattern: &str, extensions: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions: BTreeSet<String> = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        if extensions.is_empty() {
            return Err(Error::InvalidConfig(
                "supported_extensions must list at least one extension".to_string(),
            ));
        }

        Ok(Self {
            pattern: compile_anchored("file_naming_pattern", pattern)?,
            source: pattern.to_string(),
            extensions,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn is_supported_extension(&self, file_name: &str) -> bool {
        match split_extension(file_name) {
            (_, Some(ext)) => self.extensions.contains(&ext.to_lowercase()),
            (_, None) => false,
        }
    }

    pub fn is_valid_structure(&self, file_name: &str) -> bool {
        let (stem, _) = split_extension(file_name);
        match self.pattern.captures(stem) {
            Some(caps) => caps
                .name("date")
                .map_or(true, |date| is_valid_yymmdd(date.as_str())),
            None => false,
        }
    }

    /// Returns `None` for reserved names, which take no part in validation.
    /// An unsupported extension wins over a bad structure.
    pub fn validate(&self, file_name: &str) -> Option<FileVerdict> {
        if is_reserved(file_name) {
            return None;
        }
        if !self.is_supported_extension(file_name) {
            return Some(FileVerdict::UnsupportedExtension);
        }
        if !self.is_valid_structure(file_name) {
            return Some(FileVerdict::InvalidStructure);
        }
        Some(FileVerdict::Valid)
    }
}

fn is_valid_yymmdd(date: &str) -> bool {
    if date.len() != 6 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let month: u32 = date[2..4].parse().unwrap_or(0);
    let day: u32 = date[4..6].parse().unwrap_or(0);
    (1..=12).contains(&month) && (1..=31).contains(&day)
}
