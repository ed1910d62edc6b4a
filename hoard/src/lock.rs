//! Advisory store lock.
//!
//! Ingestion holds an exclusive lock on `<store>/registry.lock` across the
//! load, decide, append, and persist sequence. A second process that tries
//! to ingest into the same store fails fast with
//! [`StoreError::StoreLocked`] rather than racing on the manifest.

use crate::error::{Result, StoreError};
use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use log::{debug, warn};
use std::fs::{File, OpenOptions};

/// File name of the lock inside the store directory.
pub const LOCK_FILENAME: &str = "registry.lock";

/// An exclusive lock on a store, released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: Utf8PathBuf,
}

impl StoreLock {
    /// Take the lock for `store_dir` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StoreLocked`] if another handle holds the lock,
    /// or [`StoreError::StoreWriteFailure`] if the lock file cannot be
    /// created.
    pub fn acquire(store_dir: &Utf8Path) -> Result<Self> {
        let path = store_dir.join(LOCK_FILENAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::write_failure(&path, e))?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {
                debug!("locked {path}");
                Ok(Self { file, path })
            }
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Err(StoreError::StoreLocked { path })
            }
            Err(e) => Err(StoreError::write_failure(&path, e)),
        }
    }

    /// Return the lock file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("failed to release {}: {e}", self.path);
        } else {
            debug!("unlocked {}", self.path);
        }
    }
}
