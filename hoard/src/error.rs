//! Error types for the hoard store.
//!
//! Each variant names the file or entry involved so that the CLI can print a
//! message the user can act on. [`StoreError::exit_code`] maps every variant
//! to a distinct process exit status.

use crate::digest::ContentDigest;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Exit status when `verify` finds missing or damaged artifacts.
pub const EXIT_VERIFY_FAILED: i32 = 1;
/// Exit status when the input conflicts with an existing entry of the same
/// name. This is an outcome rather than a [`StoreError`].
pub const EXIT_NAME_CONFLICT: i32 = 3;
/// Exit status for malformed data: a corrupt manifest or a digest mismatch.
pub const EXIT_DATA_ERROR: i32 = 65;
/// Exit status for a missing input file or unknown manifest entry.
pub const EXIT_NO_INPUT: i32 = 66;
/// Exit status for an internal invariant violation.
pub const EXIT_SOFTWARE: i32 = 70;
/// Exit status for a failure to write into the store.
pub const EXIT_CANT_CREATE: i32 = 73;
/// Exit status for an I/O failure reading the manifest or an artifact.
pub const EXIT_IO_ERROR: i32 = 74;
/// Exit status when another process holds the store lock.
pub const EXIT_TEMP_FAIL: i32 = 75;
/// Exit status for an unusable configuration file.
pub const EXIT_CONFIG: i32 = 78;

/// Errors that abort a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The input file does not exist.
    #[error("input file {path} not found")]
    InputNotFound {
        /// Path that was requested.
        path: Utf8PathBuf,
    },

    /// The input file exists but could not be opened or read.
    #[error("input file {path} could not be read: {source}")]
    InputUnreadable {
        /// Path that was requested.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest exists but is not a valid registry document.
    #[error("registry {path} is corrupt: {reason}")]
    RegistryCorrupt {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Description of the parse or validation failure.
        reason: String,
    },

    /// The manifest exists but could not be read.
    #[error("registry {path} could not be read: {source}")]
    RegistryUnreadable {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A registered artifact could not be opened or decoded.
    #[error("artifact {path} could not be read: {source}")]
    ArtifactUnreadable {
        /// Artifact path.
        path: Utf8PathBuf,
        /// Underlying I/O or decoding error.
        #[source]
        source: std::io::Error,
    },

    /// Writing an artifact or the manifest failed.
    #[error("failed to write {path}: {source}")]
    StoreWriteFailure {
        /// Path that could not be written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An entry with this original name is already registered.
    ///
    /// The engine looks names up before appending, so this only surfaces when
    /// that discipline is broken.
    #[error("registry already holds an entry for {name}; this is a bug in the caller")]
    DuplicateKey {
        /// The duplicated original name.
        name: String,
    },

    /// The derived artifact name already belongs to another entry.
    #[error("stored name {stored_name} is already used by {owner}; choose the path-hash naming policy")]
    StoredNameCollision {
        /// The derived artifact file name.
        stored_name: String,
        /// Original name of the entry that owns the artifact.
        owner: String,
    },

    /// No entry is registered under the requested original name.
    #[error("no entry registered for {name}")]
    EntryNotFound {
        /// The requested original name.
        name: String,
    },

    /// Restored or re-read content does not match the recorded digest.
    #[error("digest mismatch for {name}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        /// Original name of the affected entry.
        name: String,
        /// Digest recorded in the manifest.
        expected: ContentDigest,
        /// Digest computed from the bytes on disk.
        actual: ContentDigest,
    },

    /// Command output could not be written.
    #[error("failed to write output: {source}")]
    OutputFailed {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Another process holds the store lock.
    #[error("store is locked by another process ({path})")]
    StoreLocked {
        /// Path of the lock file.
        path: Utf8PathBuf,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration {path}: {reason}")]
    Config {
        /// Configuration file path.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },
}

impl StoreError {
    /// Return the process exit status the CLI reports for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoard::error::{EXIT_NO_INPUT, StoreError};
    ///
    /// let err = StoreError::InputNotFound { path: "a.txt".into() };
    /// assert_eq!(err.exit_code(), EXIT_NO_INPUT);
    /// ```
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InputNotFound { .. }
            | Self::InputUnreadable { .. }
            | Self::EntryNotFound { .. } => EXIT_NO_INPUT,
            Self::RegistryCorrupt { .. } | Self::IntegrityMismatch { .. } => EXIT_DATA_ERROR,
            Self::StoreWriteFailure { .. } | Self::StoredNameCollision { .. } => EXIT_CANT_CREATE,
            Self::RegistryUnreadable { .. }
            | Self::ArtifactUnreadable { .. }
            | Self::OutputFailed { .. } => EXIT_IO_ERROR,
            Self::DuplicateKey { .. } => EXIT_SOFTWARE,
            Self::StoreLocked { .. } => EXIT_TEMP_FAIL,
            Self::Config { .. } => EXIT_CONFIG,
        }
    }

    /// Classify an I/O error raised while opening an input file.
    pub(crate) fn from_input_io(path: &camino::Utf8Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::InputNotFound {
                path: path.to_owned(),
            }
        } else {
            Self::InputUnreadable {
                path: path.to_owned(),
                source,
            }
        }
    }

    /// Wrap an I/O error raised while writing into the store.
    pub(crate) fn write_failure(path: &camino::Utf8Path, source: std::io::Error) -> Self {
        Self::StoreWriteFailure {
            path: path.to_owned(),
            source,
        }
    }
}

/// Result type alias using [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
