//! Store directory management.
//!
//! ```text
//! <store>/
//! ├─ LOCK          # Advisory lock for single-process access
//! └─ journal.log   # Framed commit records
//! ```

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const JOURNAL_FILE: &str = "journal.log";

/// A store directory, exclusively locked for the lifetime of this value.
#[derive(Debug)]
pub(crate) struct StoreDir {
    path: PathBuf,
    _lock_file: File,
}

impl StoreDir {
    /// Opens or creates a store directory and takes its lock.
    ///
    /// # Errors
    ///
    /// - The directory is missing and `create_if_missing` is false
    /// - Another process holds the lock ([`CoreError::StoreLocked`])
    /// - I/O errors
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::invalid_operation(format!(
                    "store directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_operation(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::StoreLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn journal_path(&self) -> PathBuf {
        self.path.join(JOURNAL_FILE)
    }
}

/// Journal path inside a store directory, without opening it.
pub(crate) fn journal_path_in(path: &Path) -> PathBuf {
    path.join(JOURNAL_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store");
        let dir = StoreDir::open(&path, true).unwrap();
        assert!(dir.path().is_dir());
        assert!(path.join(LOCK_FILE).exists());
        assert_eq!(dir.journal_path(), journal_path_in(&path));
    }

    #[test]
    fn missing_directory_without_create_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let result = StoreDir::open(&tmp.path().join("absent"), false);
        assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
    }

    #[test]
    fn second_open_is_locked_out() {
        let tmp = tempfile::tempdir().unwrap();
        let _first = StoreDir::open(tmp.path(), true).unwrap();
        let second = StoreDir::open(tmp.path(), true);
        assert!(matches!(second, Err(CoreError::StoreLocked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let _dir = StoreDir::open(tmp.path(), true).unwrap();
        }
        assert!(StoreDir::open(tmp.path(), true).is_ok());
    }
}
