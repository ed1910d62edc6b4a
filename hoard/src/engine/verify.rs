//! Artifact integrity checks.
//!
//! Verification re-digests every registered artifact and compares it with
//! the digest recorded at ingestion. It never modifies the store.

use super::{IngestObserver, Store};
use crate::digest::{self, ContentDigest};
use crate::error::Result;
use crate::registry::FileEntry;
use log::{debug, warn};
use std::fmt;
use std::io::ErrorKind;

/// A registered artifact that failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyProblem {
    /// The artifact file does not exist.
    Missing {
        /// The affected entry.
        entry: FileEntry,
    },
    /// The artifact exists but could not be read.
    Unreadable {
        /// The affected entry.
        entry: FileEntry,
        /// Description of the I/O failure.
        reason: String,
    },
    /// The artifact's digest differs from the recorded one.
    DigestMismatch {
        /// The affected entry.
        entry: FileEntry,
        /// Digest computed from the artifact on disk.
        actual: ContentDigest,
    },
}

impl VerifyProblem {
    /// Return the entry the problem concerns.
    #[must_use]
    pub const fn entry(&self) -> &FileEntry {
        match self {
            Self::Missing { entry }
            | Self::Unreadable { entry, .. }
            | Self::DigestMismatch { entry, .. } => entry,
        }
    }
}

impl fmt::Display for VerifyProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { entry } => write!(
                f,
                "{}: artifact {} is missing",
                entry.original_name(),
                entry.stored_name()
            ),
            Self::Unreadable { entry, reason } => write!(
                f,
                "{}: artifact {} could not be read: {reason}",
                entry.original_name(),
                entry.stored_name()
            ),
            Self::DigestMismatch { entry, actual } => write!(
                f,
                "{}: artifact {} has digest {actual}, expected {}",
                entry.original_name(),
                entry.stored_name(),
                entry.stored_digest()
            ),
        }
    }
}

/// Summary of a [`Store::verify`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    checked: usize,
    problems: Vec<VerifyProblem>,
}

impl VerifyReport {
    /// Return the number of entries checked.
    #[must_use]
    pub const fn checked(&self) -> usize {
        self.checked
    }

    /// Return the problems found, in manifest order.
    #[must_use]
    pub fn problems(&self) -> &[VerifyProblem] {
        &self.problems
    }

    /// Return true when every artifact matched its recorded digest.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

impl<O: IngestObserver> Store<O> {
    /// Re-digest every registered artifact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RegistryCorrupt`] or
    /// [`StoreError::RegistryUnreadable`] if the manifest cannot be loaded.
    /// Problems with individual artifacts are reported in the
    /// [`VerifyReport`], not as errors.
    ///
    /// [`StoreError::RegistryCorrupt`]: crate::error::StoreError::RegistryCorrupt
    /// [`StoreError::RegistryUnreadable`]: crate::error::StoreError::RegistryUnreadable
    pub fn verify(&self) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();
        for entry in self.load_registry()?.into_entries() {
            report.checked = report.checked.saturating_add(1);
            let artifact = self.artifact_path(&entry);
            let problem = match digest::digest_file(
                artifact.as_std_path(),
                self.config.digest,
                self.config.digest_chunk_size,
            ) {
                Ok(actual) if actual == *entry.stored_digest() => {
                    debug!("{artifact}: ok");
                    continue;
                }
                Ok(actual) => VerifyProblem::DigestMismatch { entry, actual },
                Err(e) if e.kind() == ErrorKind::NotFound => VerifyProblem::Missing { entry },
                Err(e) => VerifyProblem::Unreadable {
                    entry,
                    reason: e.to_string(),
                },
            };
            warn!("{problem}");
            report.problems.push(problem);
        }
        Ok(report)
    }
}
