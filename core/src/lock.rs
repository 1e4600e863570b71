//! Cross-process advisory locking for `sync --lock-file`.
//!
//! Non-blocking: `sync` invocations that collide exit non-zero immediately
//! rather than queueing for the lock.

use std::fs::File;
use std::path::{Path, PathBuf};

use fd_lock::{RwLock, RwLockWriteGuard};

use crate::errors::error_code::{self, TsdbErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lock file {path} is held by another process")]
    Held { path: PathBuf },
}

impl TsdbErrorCode for LockError {
    fn error_code(&self) -> &'static str {
        error_code::LOCK_ERROR
    }
}

/// A non-blocking, exclusive advisory lock backed by a single file.
///
/// Exactly one `sync` invocation may hold the write lock at a time; a second
/// invocation against the same `--lock-file` path fails immediately instead
/// of blocking.
pub struct AdvisoryLock {
    file: RwLock<File>,
    path: PathBuf,
}

impl AdvisoryLock {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(AdvisoryLock {
            file: RwLock::new(file),
            path,
        })
    }

    /// Acquire the exclusive lock (non-blocking). Fails immediately if held.
    pub fn try_acquire(&mut self) -> Result<RwLockWriteGuard<'_, File>, LockError> {
        self.file.try_write().map_err(|_| LockError::Held {
            path: self.path.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_first_guard_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.lock");

        let mut a = AdvisoryLock::open(&path).unwrap();
        let mut b = AdvisoryLock::open(&path).unwrap();

        let guard = a.try_acquire().unwrap();
        assert!(b.try_acquire().is_err());
        drop(guard);

        assert!(b.try_acquire().is_ok());
    }
}
