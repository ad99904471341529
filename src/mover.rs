use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::Error;
use crate::naming;
use crate::platform;

const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// How a folder reached its destination.
#[derive(Debug)]
pub enum Relocation {
    Renamed,
    /// Copied across volumes and the source removed.
    Copied,
    /// Copied across volumes, but the source could not be removed and may be
    /// partly deleted. The destination copy is complete.
    SourceLeftBehind(Error),
}

/// Moves `src` to `dst`. `dst` must not exist yet.
///
/// Within one volume this is a single rename. Across volumes the tree is
/// copied and the source removed afterwards; a failed copy is cleaned up so
/// the source is the only copy left.
pub fn move_folder(src: &Path, dst: &Path) -> Result<Relocation, Error> {
    if path_exists(dst).map_err(|err| Error::fs("inspect", dst, err))? {
        return Err(Error::DestinationExists(dst.to_path_buf()));
    }

    match fs::rename(src, dst) {
        Ok(()) => {
            debug!("Renamed {} -> {}", src.display(), dst.display());
            Ok(Relocation::Renamed)
        }
        Err(err) if platform::is_cross_device(&err) => {
            warn!(
                "{} and {} are on different volumes, copying instead",
                src.display(),
                dst.display()
            );
            copy_then_remove(src, dst)
        }
        Err(err) => Err(Error::fs("move", src, err)),
    }
}

fn copy_then_remove(src: &Path, dst: &Path) -> Result<Relocation, Error> {
    if let Err(err) = copy_tree(src, dst) {
        if let Err(cleanup) = fs::remove_dir_all(dst) {
            warn!("Could not clean up partial copy {}: {}", dst.display(), cleanup);
        }
        return Err(Error::fs("copy", src, err));
    }
    info!("Copied {} -> {}", src.display(), dst.display());
    Ok(remove_source(src))
}

fn remove_source(src: &Path) -> Relocation {
    match fs::remove_dir_all(src) {
        Ok(()) => Relocation::Copied,
        Err(err) => {
            error!("Copied {} but could not remove the source: {}", src.display(), err);
            Relocation::SourceLeftBehind(Error::SourceNotRemoved {
                path: src.to_path_buf(),
                source: err,
            })
        }
    }
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Renames `path` to `new_name` inside the same directory and returns the
/// path actually used. An existing file is never overwritten: a taken name is
/// stamped with `stamp`, then counted up until a free name turns up.
pub fn rename_file(path: &Path, new_name: &str, stamp: &DateTime<Local>) -> Result<PathBuf, Error> {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let mut target = dir.join(new_name);

    for attempt in 0..=MAX_RENAME_ATTEMPTS {
        if place_new(path, &target).map_err(|err| Error::fs("rename", path, err))? {
            debug!("Renamed {} -> {}", path.display(), target.display());
            return Ok(target);
        }
        target = dir.join(naming::disambiguate(new_name, stamp, attempt));
    }
    Err(Error::RenameExhausted(dir.join(new_name)))
}

/// Moves `path` to `target` only if `target` does not exist. Returns `false`
/// when the name is taken.
///
/// Linking fails on an existing target, so the check and the move are one
/// step. Volumes without hard links fall back to check then rename.
fn place_new(path: &Path, target: &Path) -> io::Result<bool> {
    match fs::hard_link(path, target) {
        Ok(()) => {
            if let Err(err) = fs::remove_file(path) {
                let _ = fs::remove_file(target);
                return Err(err);
            }
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(err),
        Err(_) => {
            if path_exists(target)? {
                return Ok(false);
            }
            fs::rename(path, target)?;
            Ok(true)
        }
    }
}

fn path_exists(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn stamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 18, 10, 15, 0).unwrap()
    }

    #[test]
    fn test_move_folder_relocates_tree() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("3019_Hart_Island");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("sub").join("a.las"), "a").unwrap();

        let dst = tmp.path().join("3019 Hart Island");
        assert!(matches!(move_folder(&src, &dst).unwrap(), Relocation::Renamed));

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dst.join("sub").join("a.las")).unwrap(), "a");
    }

    #[test]
    fn test_copy_then_remove_reports_copy() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("sub").join("a.las"), "a").unwrap();

        let dst = tmp.path().join("dst");
        assert!(matches!(copy_then_remove(&src, &dst), Ok(Relocation::Copied)));
        assert!(!src.exists());
        assert!(dst.join("sub").join("a.las").exists());
    }

    #[test]
    fn test_failed_source_removal_names_the_leftover() {
        let tmp = tempdir().unwrap();
        let gone = tmp.path().join("already_gone");

        match remove_source(&gone) {
            Relocation::SourceLeftBehind(Error::SourceNotRemoved { path, .. }) => {
                assert_eq!(path, gone)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_move_folder_refuses_existing_destination() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir(&src).unwrap();
        fs::create_dir(&dst).unwrap();

        assert!(matches!(move_folder(&src, &dst), Err(Error::DestinationExists(_))));
        assert!(src.exists());
    }

    #[test]
    fn test_copy_tree_copies_nested_files() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("a").join("b")).unwrap();
        fs::write(src.join("a").join("b").join("c.las"), "c").unwrap();
        fs::create_dir(src.join("empty")).unwrap();

        let dst = tmp.path().join("dst");
        copy_tree(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst.join("a").join("b").join("c.las")).unwrap(), "c");
        assert!(dst.join("empty").is_dir());
    }

    #[test]
    fn test_rename_file_without_conflict() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("notes.txt");
        fs::write(&file, "n").unwrap();

        let renamed = rename_file(&file, "UNSUPPORTED_notes.txt", &stamp()).unwrap();
        assert_eq!(renamed, tmp.path().join("UNSUPPORTED_notes.txt"));
        assert!(!file.exists());
    }

    #[test]
    fn test_rename_file_never_overwrites() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("UNSUPPORTED_notes.txt"), "old").unwrap();
        fs::write(
            tmp.path().join("UNSUPPORTED_notes_20261018_101500.txt"),
            "older",
        )
        .unwrap();

        let first = tmp.path().join("notes.txt");
        fs::write(&first, "new").unwrap();
        let renamed = rename_file(&first, "UNSUPPORTED_notes.txt", &stamp()).unwrap();
        assert_eq!(
            renamed,
            tmp.path().join("UNSUPPORTED_notes_20261018_101500_1.txt")
        );

        // A second file in the same second gets the next counter.
        let second = tmp.path().join("other.txt");
        fs::write(&second, "newer").unwrap();
        let renamed_again = rename_file(&second, "UNSUPPORTED_notes.txt", &stamp()).unwrap();
        assert_eq!(
            renamed_again,
            tmp.path().join("UNSUPPORTED_notes_20261018_101500_2.txt")
        );

        assert_eq!(fs::read_to_string(tmp.path().join("UNSUPPORTED_notes.txt")).unwrap(), "old");
        assert_eq!(
            fs::read_to_string(tmp.path().join("UNSUPPORTED_notes_20261018_101500.txt")).unwrap(),
            "older"
        );
        assert_eq!(fs::read_to_string(&renamed).unwrap(), "new");
        assert_eq!(fs::read_to_string(&renamed_again).unwrap(), "newer");
        assert!(!first.exists());
        assert!(!second.exists());
    }

    #[test]
    fn test_rename_file_keeps_a_target_that_appears_late() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("notes.txt");
        let taken = tmp.path().join("UNSUPPORTED_notes.txt");
        fs::write(&file, "new").unwrap();
        fs::write(&taken, "old").unwrap();

        assert!(!place_new(&file, &taken).unwrap());
        assert_eq!(fs::read_to_string(&taken).unwrap(), "old");
        assert_eq!(fs::read_to_string(&file).unwrap(), "new");
    }

    #[test]
    fn test_rename_missing_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let result = rename_file(&tmp.path().join("nope.txt"), "RENAME_nope.txt", &stamp());
        assert!(matches!(result, Err(Error::FileSystem { op: "rename", .. })));
    }
}
