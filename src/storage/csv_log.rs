use csv::WriterBuilder;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use super::models::MappingRow;
use super::StorageError;

/// Append-only CSV of original → new file locations. The header is written
/// when the file is created.
#[derive(Debug, Clone)]
pub struct MappingCsv {
    path: PathBuf,
}

impl MappingCsv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, rows: &[MappingRow]) -> Result<(), StorageError> {
        if rows.is_empty() {
            return Ok(());
        }

        let needs_header = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut wtr = WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        for row in rows {
            wtr.serialize(row)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingFlag;
    use tempfile::tempdir;

    fn row(name: &str) -> MappingRow {
        MappingRow {
            original_path: format!("/in/3019_Hart_Island/{}", name),
            new_path: format!("/out/3019 Hart Island/{}", name),
            folder: "3019 Hart Island".to_string(),
            processed_date: "2026-10-18 09:30:00".to_string(),
            naming_flag: NamingFlag::Ok,
        }
    }

    #[test]
    fn test_header_written_once() {
        let tmp = tempdir().unwrap();
        let csv = MappingCsv::new(tmp.path().join("file_mappings.csv"));

        csv.append(&[row("a.las")]).unwrap();
        csv.append(&[row("b.las")]).unwrap();

        let content = fs::read_to_string(csv.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "original_path,new_path,folder,processed_date,naming_flag");
        assert_eq!(
            lines[2],
            "/in/3019_Hart_Island/b.las,/out/3019 Hart Island/b.las,3019 Hart Island,2026-10-18 09:30:00,OK"
        );
    }

    #[test]
    fn test_empty_append_does_not_create_file() {
        let tmp = tempdir().unwrap();
        let csv = MappingCsv::new(tmp.path().join("file_mappings.csv"));
        csv.append(&[]).unwrap();
        assert!(!csv.path().exists());
    }
}
