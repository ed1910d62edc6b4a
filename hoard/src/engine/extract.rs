//! Restoring originals from their artifacts.

use super::{IngestObserver, Store};
use crate::codec::Codec;
use crate::copier::ChunkedCopier;
use crate::error::{Result, StoreError};
use crate::registry::FileEntry;
use camino::Utf8Path;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, ErrorKind};
use tempfile::NamedTempFile;

impl<O: IngestObserver> Store<O> {
    /// Restore the original registered as `original_name` to `destination`.
    ///
    /// The artifact is decoded chunk by chunk into a temporary file beside
    /// `destination` while the output is digested. The file is renamed into
    /// place only when its digest equals the recorded original digest, so a
    /// failed extraction never leaves a partial file behind.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EntryNotFound`] when no entry has that name.
    /// - [`StoreError::ArtifactUnreadable`] when the artifact is missing or
    ///   cannot be decoded.
    /// - [`StoreError::IntegrityMismatch`] when the decoded bytes do not
    ///   match the recorded digest.
    /// - [`StoreError::StoreWriteFailure`] when `destination` cannot be
    ///   written.
    pub fn extract(&self, original_name: &str, destination: &Utf8Path) -> Result<FileEntry> {
        let registry = self.load_registry()?;
        let entry = registry
            .lookup(original_name)
            .cloned()
            .ok_or_else(|| StoreError::EntryNotFound {
                name: original_name.to_owned(),
            })?;

        let artifact = self.artifact_path(&entry);
        let codec = Codec::from_stored_name(entry.stored_name()).unwrap_or_else(|| {
            warn!(
                "cannot infer codec from {}, assuming {}",
                entry.stored_name(),
                self.config.codec
            );
            self.config.codec
        });
        let source = File::open(&artifact).map_err(|e| StoreError::ArtifactUnreadable {
            path: artifact.clone(),
            source: e,
        })?;
        let mut decoder = codec
            .decoder(source)
            .map_err(|e| StoreError::ArtifactUnreadable {
                path: artifact.clone(),
                source: e,
            })?;

        let parent = match destination.parent() {
            Some(dir) if !dir.as_str().is_empty() => dir,
            _ => Utf8Path::new("."),
        };
        let mut temp =
            NamedTempFile::new_in(parent).map_err(|e| StoreError::write_failure(destination, e))?;

        let mut stream = self.config.digest.stream();
        let copied = ChunkedCopier::new(self.config.copy_chunk_size)
            .copy_with_tap(&mut decoder, temp.as_file_mut(), |chunk| stream.update(chunk))
            .map_err(|e| {
                if is_decode_error(&e) {
                    StoreError::ArtifactUnreadable {
                        path: artifact.clone(),
                        source: e,
                    }
                } else {
                    StoreError::write_failure(destination, e)
                }
            })?;

        let actual = stream.finalize();
        if actual != *entry.original_digest() {
            return Err(StoreError::IntegrityMismatch {
                name: entry.original_name().to_owned(),
                expected: entry.original_digest().clone(),
                actual,
            });
        }

        temp.as_file()
            .sync_all()
            .map_err(|e| StoreError::write_failure(destination, e))?;
        temp.persist(destination)
            .map_err(|e| StoreError::write_failure(destination, e.error))?;
        debug!("decoded {copied} bytes from {artifact}");
        info!("restored {original_name} to {destination}");
        Ok(entry)
    }
}

/// Return true when `error` came from a decoder rejecting its input.
fn is_decode_error(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof
    )
}
