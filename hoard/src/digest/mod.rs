//! Incremental content digests.
//!
//! A [`DigestStream`] accumulates chunks and produces a [`ContentDigest`]
//! once. The algorithm is chosen at runtime through [`DigestAlgorithm`] so
//! the manifest can keep the legacy SHA-1 fields or move to SHA-256.
//!
//! # Sub-modules
//!
//! - [`content_digest`] - Validated hex digest newtype (`ContentDigest`).

pub mod content_digest;

pub use content_digest::{ContentDigest, DigestError};

use crate::copier::{ChunkSize, ChunkedCopier};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-1, 40 hex characters. Matches manifests written by earlier tools.
    #[default]
    Sha1,
    /// SHA-256, 64 hex characters.
    Sha256,
}

impl DigestAlgorithm {
    /// Return the short lowercase name, also used in manifest field names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// Return the length of a hex-encoded digest for this algorithm.
    #[must_use]
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 => 64,
        }
    }

    /// Create a fresh accumulator for this algorithm.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoard::digest::DigestAlgorithm;
    ///
    /// let mut stream = DigestAlgorithm::Sha1.stream();
    /// stream.update(b"hello");
    /// assert_eq!(
    ///     stream.finalize().as_str(),
    ///     "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
    /// );
    /// ```
    #[must_use]
    pub fn stream(self) -> Box<dyn DigestStream> {
        match self {
            Self::Sha1 => Box::new(Sha1Stream(Sha1::new())),
            Self::Sha256 => Box::new(Sha256Stream(Sha256::new())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stateful digest accumulator.
///
/// Feed every chunk through [`DigestStream::update`] in stream order, then
/// call [`DigestStream::finalize`] exactly once. Finalising consumes the
/// stream.
pub trait DigestStream {
    /// Absorb the next chunk of input.
    fn update(&mut self, chunk: &[u8]);

    /// Finish the digest and return its hex form.
    fn finalize(self: Box<Self>) -> ContentDigest;
}

struct Sha1Stream(Sha1);

impl DigestStream for Sha1Stream {
    fn update(&mut self, chunk: &[u8]) {
        Digest::update(&mut self.0, chunk);
    }

    fn finalize(self: Box<Self>) -> ContentDigest {
        ContentDigest::from_lower_hex(format!("{:x}", self.0.finalize()))
    }
}

struct Sha256Stream(Sha256);

impl DigestStream for Sha256Stream {
    fn update(&mut self, chunk: &[u8]) {
        Digest::update(&mut self.0, chunk);
    }

    fn finalize(self: Box<Self>) -> ContentDigest {
        ContentDigest::from_lower_hex(format!("{:x}", self.0.finalize()))
    }
}

/// Digest everything `reader` yields, reading `chunk_size` bytes at a time.
///
/// # Errors
///
/// Returns any I/O error raised by `reader`.
pub fn digest_reader<R: Read + ?Sized>(
    reader: &mut R,
    algorithm: DigestAlgorithm,
    chunk_size: ChunkSize,
) -> io::Result<ContentDigest> {
    let mut stream = algorithm.stream();
    ChunkedCopier::new(chunk_size).copy_with_tap(reader, &mut io::sink(), |chunk| {
        stream.update(chunk);
    })?;
    Ok(stream.finalize())
}

/// Digest the file at `path`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn digest_file(
    path: &Path,
    algorithm: DigestAlgorithm,
    chunk_size: ChunkSize,
) -> io::Result<ContentDigest> {
    let mut file = File::open(path)?;
    digest_reader(&mut file, algorithm, chunk_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";
    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[rstest]
    #[case::sha1(DigestAlgorithm::Sha1, HELLO_SHA1)]
    #[case::sha256(DigestAlgorithm::Sha256, HELLO_SHA256)]
    fn known_vectors(#[case] algorithm: DigestAlgorithm, #[case] expected: &str) {
        let digest = digest_reader(
            &mut Cursor::new(b"hello"),
            algorithm,
            ChunkSize::DIGEST_DEFAULT,
        )
        .expect("in-memory read");
        assert_eq!(digest.as_str(), expected);
        assert_eq!(digest.as_str().len(), algorithm.hex_len());
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(7)]
    #[case(4096)]
    fn digest_is_independent_of_chunk_size(#[case] chunk: usize) {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let reference = digest_reader(
            &mut Cursor::new(&data),
            DigestAlgorithm::Sha256,
            ChunkSize::DIGEST_DEFAULT,
        )
        .expect("reference digest");
        let size = ChunkSize::new(chunk).expect("non-zero chunk");
        let digest = digest_reader(&mut Cursor::new(&data), DigestAlgorithm::Sha256, size)
            .expect("chunked digest");
        assert_eq!(digest, reference);
    }

    #[test]
    fn empty_input_has_well_known_digest() {
        let digest = digest_reader(
            &mut Cursor::new(Vec::new()),
            DigestAlgorithm::Sha1,
            ChunkSize::COPY_DEFAULT,
        )
        .expect("empty read");
        assert_eq!(digest.as_str(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn digest_file_reports_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = digest_file(
            &dir.path().join("absent"),
            DigestAlgorithm::Sha1,
            ChunkSize::DIGEST_DEFAULT,
        )
        .expect_err("missing file");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn algorithm_names_follow_manifest_convention() {
        assert_eq!(DigestAlgorithm::Sha1.to_string(), "sha1");
        assert_eq!(DigestAlgorithm::Sha256.name(), "sha256");
    }
}
