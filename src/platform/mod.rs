#[cfg(target_os = "windows")]
mod windows;

use std::io;

/// Errors a file held open by another program (typically the spreadsheet
/// open in Excel) produces when we try to replace it.
#[cfg(target_os = "windows")]
pub fn is_lock_error(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied || windows::is_sharing_violation(err)
}

#[cfg(not(target_os = "windows"))]
pub fn is_lock_error(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

/// A rename failed because source and target live on different volumes.
#[cfg(target_os = "windows")]
pub fn is_cross_device(err: &io::Error) -> bool {
    windows::is_not_same_device(err)
}

#[cfg(not(target_os = "windows"))]
pub fn is_cross_device(err: &io::Error) -> bool {
    // EXDEV on Linux and macOS
    err.raw_os_error() == Some(18)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_is_a_lock() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "busy");
        assert!(is_lock_error(&err));
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(!is_lock_error(&err));
    }
}
