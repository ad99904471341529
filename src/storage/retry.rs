use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::warn;

use super::StorageError;

/// Bounded retry for writes that can hit a file held open elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Runs `op` until it succeeds, fails with something other than a lock, or
    /// the attempts run out. Blocks the calling thread between attempts.
    pub fn run<T, F>(&self, path: &Path, mut op: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Result<T, StorageError>,
    {
        let attempts = self.attempts.max(1);

        for attempt in 1..=attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_lock() => {
                    if attempt < attempts {
                        warn!(
                            "{} is locked, retry {}/{} in {}s",
                            path.display(),
                            attempt,
                            attempts,
                            self.delay.as_secs()
                        );
                        thread::sleep(self.delay);
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Err(StorageError::Locked {
            path: path.to_path_buf(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;

    fn locked() -> StorageError {
        StorageError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
    }

    #[test]
    fn test_succeeds_after_transient_lock() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let result = policy.run(Path::new("log.xlsx"), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(locked())
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_gives_up_after_all_attempts() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(4, Duration::ZERO);
        let result: Result<(), _> = policy.run(Path::new("log.xlsx"), || {
            calls.set(calls.get() + 1);
            Err(locked())
        });
        assert!(matches!(result, Err(StorageError::Locked { attempts: 4, .. })));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_other_errors_are_not_retried() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let result: Result<(), _> = policy.run(Path::new("log.xlsx"), || {
            calls.set(calls.get() + 1);
            Err(StorageError::Io(io::Error::new(io::ErrorKind::NotFound, "gone")))
        });
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(calls.get(), 1);
    }
}
