use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::compile_anchored;
use crate::error::Error;

lazy_static! {
    static ref SEPARATOR_RUN: Regex = Regex::new(r"[\s_\-]+").expect("separator regex");
    static ref GLUED_PROJECT_NUMBER: Regex =
        Regex::new(r"^(\d{4}(?:\.\d{2})?)([^\s\d.])").expect("project number regex");
}

/// Per-folder marker written to the "Naming Flag" column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamingFlag {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "X")]
    X,
}

impl NamingFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingFlag::Ok => "OK",
            NamingFlag::X => "X",
        }
    }
}

impl fmt::Display for NamingFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameVerdict {
    Valid(String),
    Repaired { original: String, repaired: String },
    Unrepairable(String),
}

impl NameVerdict {
    /// Name the folder carries once it lands in the destination.
    pub fn final_name(&self) -> &str {
        match self {
            NameVerdict::Valid(name) => name,
            NameVerdict::Repaired { repaired, .. } => repaired,
            NameVerdict::Unrepairable(original) => original,
        }
    }

    pub fn original_name(&self) -> &str {
        match self {
            NameVerdict::Valid(name) => name,
            NameVerdict::Repaired { original, .. } => original,
            NameVerdict::Unrepairable(original) => original,
        }
    }

    pub fn flag(&self) -> NamingFlag {
        match self {
            NameVerdict::Valid(_) | NameVerdict::Repaired { .. } => NamingFlag::Ok,
            NameVerdict::Unrepairable(_) => NamingFlag::X,
        }
    }
}

/// Compiled folder naming convention: a four digit project number, optionally
/// followed by a two digit sub-phase, a space, and a free text name.
#[derive(Debug, Clone)]
pub struct FolderNamePattern {
    regex: Regex,
    source: String,
}

impl FolderNamePattern {
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Ok(Self {
            regex: compile_anchored("naming_pattern", pattern)?,
            source: pattern.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn validate(&self, name: &str) -> NameVerdict {
        if self.is_match(name) {
            return NameVerdict::Valid(name.to_string());
        }

        let repaired = repair_folder_name(name);
        if repaired != name && self.is_match(&repaired) {
            NameVerdict::Repaired {
                original: name.to_string(),
                repaired,
            }
        } else {
            NameVerdict::Unrepairable(name.to_string())
        }
    }
}

/// Structural repair of a folder name. Underscores, hyphens and whitespace runs
/// become a single space, and a project number glued to the text that follows
/// it gets a space inserted after it.
pub fn repair_folder_name(name: &str) -> String {
    let spaced = SEPARATOR_RUN.replace_all(name, " ");
    let trimmed = spaced.trim();
    GLUED_PROJECT_NUMBER
        .replace(trimmed, "$1 $2")
        .into_owned()
}
