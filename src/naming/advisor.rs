use chrono::{DateTime, Local};

use super::file::{split_extension, FileVerdict};

/// Prefix that parks a file for manual review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationPrefix {
    Rename,
    Unsupported,
}

impl ReservationPrefix {
    pub const ALL: [ReservationPrefix; 2] = [ReservationPrefix::Rename, ReservationPrefix::Unsupported];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationPrefix::Rename => "RENAME_",
            ReservationPrefix::Unsupported => "UNSUPPORTED_",
        }
    }

    pub fn for_verdict(verdict: FileVerdict) -> Option<Self> {
        match verdict {
            FileVerdict::Valid => None,
            FileVerdict::InvalidStructure => Some(ReservationPrefix::Rename),
            FileVerdict::UnsupportedExtension => Some(ReservationPrefix::Unsupported),
        }
    }

    pub fn apply(&self, file_name: &str) -> String {
        format!("{}{}", self.as_str(), file_name)
    }
}

/// Target name for a flagged file, or `None` when the file stays as it is.
pub fn advise(file_name: &str, verdict: FileVerdict) -> Option<String> {
    ReservationPrefix::for_verdict(verdict).map(|prefix| prefix.apply(file_name))
}

/// Alternative for a target name that is already taken. Attempt 0 appends the
/// `_YYYYMMDD_HHMMSS` stamp before the extension; later attempts add a counter
/// after the stamp.
pub fn disambiguate(target: &str, stamp: &DateTime<Local>, attempt: u32) -> String {
    let (stem, ext) = split_extension(target);
    let stamp = stamp.format("%Y%m%d_%H%M%S");
    let stem = if attempt == 0 {
        format!("{}_{}", stem, stamp)
    } else {
        format!("{}_{}_{}", stem, stamp, attempt)
    };
    match ext {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 18, 10, 15, 0).unwrap()
    }

    #[test]
    fn test_advise_by_verdict() {
        assert_eq!(advise("a.las", FileVerdict::Valid), None);
        assert_eq!(
            advise("survey.las", FileVerdict::InvalidStructure).as_deref(),
            Some("RENAME_survey.las")
        );
        assert_eq!(
            advise("notes.txt", FileVerdict::UnsupportedExtension).as_deref(),
            Some("UNSUPPORTED_notes.txt")
        );
    }

    #[test]
    fn test_disambiguate_inserts_stamp_before_extension() {
        assert_eq!(
            disambiguate("UNSUPPORTED_notes.txt", &stamp(), 0),
            "UNSUPPORTED_notes_20261018_101500.txt"
        );
        assert_eq!(
            disambiguate("UNSUPPORTED_notes.txt", &stamp(), 2),
            "UNSUPPORTED_notes_20261018_101500_2.txt"
        );
        assert_eq!(
            disambiguate("RENAME_Makefile", &stamp(), 0),
            "RENAME_Makefile_20261018_101500"
        );
    }
}
