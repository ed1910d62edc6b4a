//! Ingestion engine and store operations.
//!
//! [`Store`] ties the leaf components together. `ingest` digests the input,
//! consults the registry, and either reports that the file is already
//! stored, reports a name conflict, or compresses the file into the store
//! and registers it. The same type restores files (`extract`), re-checks
//! artifacts (`verify`), and lists the manifest (`entries`).
//!
//! # Sub-modules
//!
//! - `extract` - Restoring an original from its artifact
//! - [`observer`] - Progress events and observers
//! - [`verify`] - Artifact integrity report

mod extract;
pub mod observer;
pub mod verify;

pub use observer::{IngestEvent, IngestObserver, NoopObserver};
#[cfg(any(test, feature = "test-support"))]
pub use observer::RecordingObserver;
pub use verify::{VerifyProblem, VerifyReport};

use crate::codec::Codec;
use crate::config::StoreConfig;
use crate::copier::ChunkedCopier;
use crate::digest::{self, ContentDigest};
use crate::error::{Result, StoreError};
use crate::lock::StoreLock;
use crate::registry::{FileEntry, Registry};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs::File;
use std::io;
use tempfile::NamedTempFile;

/// Result of a successful [`Store::ingest`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An entry with this name and content already exists; nothing changed.
    AlreadyStored {
        /// The existing entry.
        entry: FileEntry,
    },
    /// An entry with this name exists but the content differs; nothing
    /// changed.
    NameConflict {
        /// Original digest recorded in the manifest.
        existing_digest: ContentDigest,
        /// Digest of the file that was offered.
        incoming_digest: ContentDigest,
    },
    /// The file was compressed into the store and registered.
    Stored {
        /// The new entry.
        entry: FileEntry,
    },
}

/// A content-addressed store rooted at a directory.
#[derive(Debug)]
pub struct Store<O = NoopObserver> {
    config: StoreConfig,
    observer: O,
}

impl Store {
    /// Open a store with no progress reporting.
    #[must_use]
    pub const fn new(config: StoreConfig) -> Self {
        Self {
            config,
            observer: NoopObserver,
        }
    }
}

impl<O: IngestObserver> Store<O> {
    /// Open a store that reports ingestion progress to `observer`.
    #[must_use]
    pub const fn with_observer(config: StoreConfig, observer: O) -> Self {
        Self { config, observer }
    }

    /// Return the configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Return the observer.
    #[must_use]
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Return the store directory.
    #[must_use]
    pub fn store_dir(&self) -> &Utf8Path {
        &self.config.store_dir
    }

    /// Ingest the file at `input`.
    ///
    /// The input path, exactly as given, becomes the entry's original name.
    /// The store directory is created if needed. Manifest access is guarded
    /// by the store lock for the whole call.
    ///
    /// When the outcome is [`Outcome::AlreadyStored`] or
    /// [`Outcome::NameConflict`], the only filesystem writes are creating
    /// the store directory and its `registry.lock` file; the manifest and
    /// artifacts are left untouched.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InputNotFound`] / [`StoreError::InputUnreadable`]
    ///   when the input cannot be read.
    /// - [`StoreError::StoreLocked`] when another process is ingesting.
    /// - [`StoreError::RegistryCorrupt`] / [`StoreError::RegistryUnreadable`]
    ///   when the manifest cannot be loaded.
    /// - [`StoreError::StoredNameCollision`] when the derived artifact name
    ///   belongs to another entry.
    /// - [`StoreError::StoreWriteFailure`] when the artifact or manifest
    ///   cannot be written.
    pub fn ingest(&mut self, input: &Utf8Path) -> Result<Outcome> {
        self.observer.notify(&IngestEvent::DigestingOriginal {
            path: input.to_owned(),
        });
        let incoming_digest = digest::digest_file(
            input.as_std_path(),
            self.config.digest,
            self.config.digest_chunk_size,
        )
        .map_err(|e| StoreError::from_input_io(input, e))?;
        debug!("{input}: {} {incoming_digest}", self.config.digest);
        self.observer.notify(&IngestEvent::OriginalDigest {
            digest: incoming_digest.clone(),
        });

        let store_dir = self.config.store_dir.clone();
        std::fs::create_dir_all(&store_dir).map_err(|e| StoreError::write_failure(&store_dir, e))?;
        let _lock = StoreLock::acquire(&store_dir)?;
        let mut registry = self.load_registry()?;

        if let Some(existing) = registry.lookup(input.as_str()) {
            return Ok(if *existing.original_digest() == incoming_digest {
                info!("{input} is already stored as {}", existing.stored_name());
                Outcome::AlreadyStored {
                    entry: existing.clone(),
                }
            } else {
                info!("{input} conflicts with the registered content");
                Outcome::NameConflict {
                    existing_digest: existing.original_digest().clone(),
                    incoming_digest,
                }
            });
        }

        let stored_name = self.stored_name_for(input, &registry)?;
        let artifact = store_dir.join(&stored_name);
        self.observer.notify(&IngestEvent::Compressing {
            stored_name: stored_name.clone(),
            codec: self.config.codec,
        });
        self.compress_into(input, &artifact)?;

        let stored_digest = digest::digest_file(
            artifact.as_std_path(),
            self.config.digest,
            self.config.digest_chunk_size,
        )
        .map_err(|e| StoreError::write_failure(&artifact, e))?;
        self.observer.notify(&IngestEvent::StoredDigest {
            digest: stored_digest.clone(),
        });

        let entry = FileEntry::new(input.as_str(), incoming_digest, stored_name, stored_digest);
        registry.append(entry.clone())?;
        registry.persist(&store_dir)?;
        info!("stored {input} as {artifact}");
        self.observer.notify(&IngestEvent::Registered {
            entry: entry.clone(),
        });
        Ok(Outcome::Stored { entry })
    }

    /// Load the manifest and return its entries in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RegistryCorrupt`] or
    /// [`StoreError::RegistryUnreadable`] if the manifest cannot be loaded.
    pub fn entries(&self) -> Result<Vec<FileEntry>> {
        Ok(self.load_registry()?.into_entries())
    }

    fn load_registry(&self) -> Result<Registry> {
        Registry::load(
            &self.config.store_dir,
            self.config.record_keys(),
            self.config.digest,
        )
    }

    fn artifact_path(&self, entry: &FileEntry) -> Utf8PathBuf {
        self.config.store_dir.join(entry.stored_name())
    }

    fn stored_name_for(&self, input: &Utf8Path, registry: &Registry) -> Result<String> {
        let stored_name = self
            .config
            .naming
            .stored_name(input, self.config.codec)
            .ok_or_else(|| StoreError::InputUnreadable {
                path: input.to_owned(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            })?;
        if let Some(owner) = registry.lookup_stored(&stored_name) {
            return Err(StoreError::StoredNameCollision {
                stored_name,
                owner: owner.original_name().to_owned(),
            });
        }
        Ok(stored_name)
    }

    /// Compress `input` into a temporary file beside `artifact`, then rename
    /// it into place.
    fn compress_into(&self, input: &Utf8Path, artifact: &Utf8Path) -> Result<()> {
        let mut source = File::open(input).map_err(|e| StoreError::from_input_io(input, e))?;
        let mut temp = NamedTempFile::new_in(&self.config.store_dir)
            .map_err(|e| StoreError::write_failure(artifact, e))?;

        let copier = ChunkedCopier::new(self.config.copy_chunk_size);
        let written = encode(self.config.codec, copier, &mut source, temp.as_file_mut())
            .map_err(|e| StoreError::write_failure(artifact, e))?;

        temp.persist(artifact)
            .map_err(|e| StoreError::write_failure(artifact, e.error))?;
        debug!("compressed {written} bytes from {input} into {artifact}");
        Ok(())
    }
}

/// Stream `source` through `codec` into `sink` and sync it to disk.
fn encode(codec: Codec, copier: ChunkedCopier, source: &mut File, sink: &mut File) -> io::Result<u64> {
    let mut encoder = codec.encoder(sink)?;
    let copied = copier.copy(source, &mut encoder)?;
    encoder.finish()?.sync_all()?;
    Ok(copied)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
