use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Immediate subdirectory of the source directory, discovered fresh each run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFolder {
    pub path: PathBuf,
    pub name: String,
}

/// Snapshot of one file inside a candidate folder, taken at scan time.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Path relative to the candidate folder root.
    pub relative_path: PathBuf,
    pub file_name: String,
    pub created: DateTime<Local>,
}

/// Lists the directories directly under `source_dir`, sorted by name.
/// Paths in `exclude` (typically the destination root) are never candidates.
pub fn list_candidate_folders(
    source_dir: &Path,
    exclude: &[&Path],
) -> io::Result<Vec<CandidateFolder>> {
    let entries = fs::read_dir(source_dir).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("Error reading directory {}: {}", source_dir.display(), err),
        )
    })?;

    let mut folders = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            io::Error::new(
                err.kind(),
                format!(
                    "Error reading entry in directory {}: {}",
                    source_dir.display(),
                    err
                ),
            )
        })?;

        let path = entry.path();
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if exclude.iter().any(|excluded| *excluded == path.as_path()) {
            debug!("Ignoring excluded directory {}", path.display());
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => folders.push(CandidateFolder { path, name }),
            Err(raw) => warn!("Skipping folder with non UTF-8 name: {:?}", raw),
        }
    }

    folders.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(folders)
}

/// Recursively collects every regular file under `folder`. Symlinks are not
/// followed.
pub fn walk_files(folder: &Path) -> io::Result<Vec<FileRecord>> {
    let mut records = Vec::new();

    for entry in WalkDir::new(folder).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = entry.metadata()?;
        // Birth time is not recorded on every file system.
        let created = metadata.created().or_else(|_| metadata.modified())?;

        let path = entry.into_path();
        let relative_path = path
            .strip_prefix(folder)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        records.push(FileRecord {
            path,
            relative_path,
            file_name,
            created: DateTime::<Local>::from(created),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_candidate_folders_are_directories_only() {
        let tmp = tempdir().unwrap();
        fs::create_dir(tmp.path().join("b_folder")).unwrap();
        fs::create_dir(tmp.path().join("a_folder")).unwrap();
        fs::create_dir(tmp.path().join("processed")).unwrap();
        fs::write(tmp.path().join("loose.txt"), "x").unwrap();

        let excluded = tmp.path().join("processed");
        let folders = list_candidate_folders(tmp.path(), &[excluded.as_path()]).unwrap();
        let names: Vec<&str> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a_folder", "b_folder"]);
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let tmp = tempdir().unwrap();
        assert!(list_candidate_folders(&tmp.path().join("nope"), &[]).is_err());
    }

    #[test]
    fn test_walk_files_is_recursive_with_relative_paths() {
        let tmp = tempdir().unwrap();
        let nested = tmp.path().join("scans").join("level2");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("top.las"), "a").unwrap();
        fs::write(nested.join("deep.laz"), "b").unwrap();

        let files = walk_files(tmp.path()).unwrap();
        assert_eq!(files.len(), 2);

        let deep = files.iter().find(|f| f.file_name == "deep.laz").unwrap();
        assert_eq!(deep.relative_path, Path::new("scans").join("level2").join("deep.laz"));
        assert_eq!(deep.path, nested.join("deep.laz"));
    }
}
