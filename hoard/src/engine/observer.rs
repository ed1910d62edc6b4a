//! Progress reporting for ingestion.

use crate::codec::Codec;
use crate::digest::ContentDigest;
use crate::registry::FileEntry;
use camino::Utf8PathBuf;

/// A step reached during [`Store::ingest`](super::Store::ingest).
///
/// Events arrive in the order listed here. An ingest that ends in
/// `AlreadyStored` or `NameConflict` stops after [`OriginalDigest`].
///
/// [`OriginalDigest`]: IngestEvent::OriginalDigest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    /// The original file is about to be digested.
    DigestingOriginal {
        /// Input path.
        path: Utf8PathBuf,
    },
    /// The original digest is known.
    OriginalDigest {
        /// Digest of the original bytes.
        digest: ContentDigest,
    },
    /// Compression into the store has started.
    Compressing {
        /// Artifact file name.
        stored_name: String,
        /// Codec in use.
        codec: Codec,
    },
    /// The artifact digest is known.
    StoredDigest {
        /// Digest of the artifact bytes.
        digest: ContentDigest,
    },
    /// The entry is in the manifest and the manifest is on disk.
    Registered {
        /// The new entry.
        entry: FileEntry,
    },
}

/// Receives [`IngestEvent`]s as ingestion progresses.
#[cfg_attr(test, mockall::automock)]
pub trait IngestObserver {
    /// Handle one event.
    fn notify(&mut self, event: &IngestEvent);
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl IngestObserver for NoopObserver {
    fn notify(&mut self, _event: &IngestEvent) {}
}

/// Observer that keeps every event in memory.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Vec<IngestEvent>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingObserver {
    /// Return the events seen so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[IngestEvent] {
        &self.events
    }

    /// Return a short label for each event, oldest first.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .map(|event| match event {
                IngestEvent::DigestingOriginal { .. } => "digesting-original",
                IngestEvent::OriginalDigest { .. } => "original-digest",
                IngestEvent::Compressing { .. } => "compressing",
                IngestEvent::StoredDigest { .. } => "stored-digest",
                IngestEvent::Registered { .. } => "registered",
            })
            .collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl IngestObserver for RecordingObserver {
    fn notify(&mut self, event: &IngestEvent) {
        self.events.push(event.clone());
    }
}
