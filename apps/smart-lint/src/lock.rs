//! Advisory lock scoped to the working-tree root.
//!
//! Fix passes rewrite files in place, so two runs on the same tree must not
//! overlap. The lock file lives in the system temp dir, named after a hash
//! of the canonical root, and is released when the guard drops.

use crate::error::{Error, Result};
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const POLL: Duration = Duration::from_millis(100);

/// Holds the exclusive lock until dropped.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::debug!("unlock {}: {e}", self.path.display());
        }
    }
}

/// Lock file path for `root` inside `dir`.
///
/// Named after SHA-256 of the canonical root, so every smart-lint build
/// agrees on it.
pub fn lock_path(dir: &Path, root: &Path) -> PathBuf {
    let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let digest = Sha256::digest(canonical.to_string_lossy().as_bytes());
    let id: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
    dir.join(format!("smart-lint-{id}.lock"))
}

/// Acquire the lock for `root`, polling until `timeout` elapses.
pub fn acquire(root: &Path, timeout: Duration) -> Result<LockGuard> {
    acquire_in(&std::env::temp_dir(), root, timeout)
}

pub fn acquire_in(dir: &Path, root: &Path, timeout: Duration) -> Result<LockGuard> {
    let path = lock_path(dir, root);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|source| Error::Lock {
            path: path.clone(),
            source,
        })?;
    let start = Instant::now();
    let mut announced = false;
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => {
                log::debug!("acquired lock {}", path.display());
                return Ok(LockGuard { file, path });
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                if start.elapsed() >= timeout {
                    return Err(Error::LockTimeout {
                        root: root.to_path_buf(),
                        waited_secs: start.elapsed().as_secs(),
                    });
                }
                if !announced {
                    log::info!("waiting for another smart-lint run on {}", root.display());
                    announced = true;
                }
                thread::sleep(POLL);
            }
            Err(source) => return Err(Error::Lock { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_acquire_times_out_until_release() {
        let locks = tempdir().unwrap();
        let root = tempdir().unwrap();
        let guard = acquire_in(locks.path(), root.path(), Duration::from_secs(1)).unwrap();
        let err = acquire_in(locks.path(), root.path(), Duration::from_millis(250)).unwrap_err();
        assert!(matches!(err, Error::LockTimeout { .. }));
        drop(guard);
        assert!(acquire_in(locks.path(), root.path(), Duration::from_millis(250)).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_lock_name_is_stable_across_builds() {
        let locks = Path::new("/tmp");
        let root = Path::new("/nonexistent/smart-lint-root");
        assert_eq!(
            lock_path(locks, root),
            PathBuf::from("/tmp/smart-lint-41ab8ff503219929.lock")
        );
        assert_eq!(lock_path(locks, root), lock_path(locks, root));
    }

    #[test]
    fn test_distinct_roots_do_not_contend() {
        let locks = tempdir().unwrap();
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        assert_ne!(lock_path(locks.path(), a.path()), lock_path(locks.path(), b.path()));
        let _ga = acquire_in(locks.path(), a.path(), Duration::from_millis(100)).unwrap();
        let gb = acquire_in(locks.path(), b.path(), Duration::from_millis(100)).unwrap();
        assert!(gb.path().starts_with(locks.path()));
    }
}
