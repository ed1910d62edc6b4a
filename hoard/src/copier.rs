//! Chunk-by-chunk transfer between streams.
//!
//! The copier never holds more than one chunk in memory, which is what lets
//! the store handle files larger than RAM. Every byte read from the source is
//! handed to the tap and the sink exactly once, in stream order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, ErrorKind, Read, Write};
use std::num::NonZeroUsize;

/// A validated, non-zero chunk size in bytes.
///
/// # Examples
///
/// ```
/// use hoard::copier::ChunkSize;
///
/// assert_eq!(ChunkSize::COPY_DEFAULT.get(), 8 * 1024);
/// assert!(ChunkSize::new(0).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct ChunkSize(NonZeroUsize);

impl ChunkSize {
    /// Largest chunk size a configuration may ask for (64 MiB).
    pub const MAX_BYTES: usize = 64 * 1024 * 1024;

    /// Default chunk size for plain copy and compression passes (8 KiB).
    pub const COPY_DEFAULT: Self = Self(non_zero(8 * 1024));

    /// Default chunk size for digest-only passes (64 KiB).
    pub const DIGEST_DEFAULT: Self = Self(non_zero(64 * 1024));

    /// Create a chunk size, rejecting zero.
    #[must_use]
    pub const fn new(bytes: usize) -> Option<Self> {
        match NonZeroUsize::new(bytes) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Return the size in bytes.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

const fn non_zero(bytes: usize) -> NonZeroUsize {
    match NonZeroUsize::new(bytes) {
        Some(value) => value,
        None => panic!("chunk size constants must be non-zero"),
    }
}

impl TryFrom<usize> for ChunkSize {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "chunk size must be greater than zero".to_owned())
    }
}

impl From<ChunkSize> for usize {
    fn from(value: ChunkSize) -> Self {
        value.get()
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

/// Drives fixed-size chunk transfer from a reader to a writer.
#[derive(Debug, Clone, Copy)]
pub struct ChunkedCopier {
    chunk_size: ChunkSize,
}

impl ChunkedCopier {
    /// Create a copier that reads `chunk_size` bytes at a time.
    #[must_use]
    pub const fn new(chunk_size: ChunkSize) -> Self {
        Self { chunk_size }
    }

    /// Return the configured chunk size.
    #[must_use]
    pub const fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    /// Copy `source` into `sink` and return the number of bytes moved.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error raised by either stream.
    pub fn copy<R, W>(&self, source: &mut R, sink: &mut W) -> io::Result<u64>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        self.copy_with_tap(source, sink, |_| {})
    }

    /// Copy `source` into `sink`, showing each chunk to `tap` before it is
    /// written.
    ///
    /// The stream ends when a read returns zero bytes. Short reads are not
    /// treated as end of stream, so pipes and decoders that return partial
    /// chunks are handled correctly. The sink is flushed before returning.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error raised by either stream. Interrupted
    /// reads are retried.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoard::copier::{ChunkSize, ChunkedCopier};
    /// use std::io::Cursor;
    ///
    /// let copier = ChunkedCopier::new(ChunkSize::new(2).expect("non-zero"));
    /// let mut sink = Vec::new();
    /// let mut chunks = Vec::new();
    /// let copied = copier
    ///     .copy_with_tap(&mut Cursor::new(b"hello"), &mut sink, |c| chunks.push(c.len()))
    ///     .expect("in-memory copy");
    /// assert_eq!(copied, 5);
    /// assert_eq!(sink, b"hello");
    /// assert_eq!(chunks, vec![2, 2, 1]);
    /// ```
    pub fn copy_with_tap<R, W, T>(&self, source: &mut R, sink: &mut W, mut tap: T) -> io::Result<u64>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
        T: FnMut(&[u8]),
    {
        let mut buffer = vec![0u8; self.chunk_size.get()];
        let mut total: u64 = 0;
        loop {
            let read = match source.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            let chunk = buffer
                .get(..read)
                .ok_or_else(|| io::Error::other("reader reported more bytes than requested"))?;
            tap(chunk);
            sink.write_all(chunk)?;
            total = total.saturating_add(read as u64);
        }
        sink.flush()?;
        Ok(total)
    }
}

impl Default for ChunkedCopier {
    fn default() -> Self {
        Self::new(ChunkSize::COPY_DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    /// Reader that yields one byte per call and interrupts every other call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        interrupt_next: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupt_next {
                self.interrupt_next = false;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            self.interrupt_next = true;
            match (self.data.get(self.pos), buf.first_mut()) {
                (Some(byte), Some(slot)) => {
                    *slot = *byte;
                    self.pos += 1;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    #[case(8192)]
    fn every_byte_reaches_sink_and_tap_in_order(#[case] size: usize) {
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 256) as u8).collect();
        let copier = ChunkedCopier::new(ChunkSize::new(size).expect("non-zero"));
        let mut sink = Vec::new();
        let mut tapped = Vec::new();

        let copied = copier
            .copy_with_tap(&mut Cursor::new(&data), &mut sink, |c| {
                tapped.extend_from_slice(c);
            })
            .expect("copy");

        assert_eq!(copied, 1000);
        assert_eq!(sink, data);
        assert_eq!(tapped, data);
    }

    #[test]
    fn short_reads_do_not_end_the_stream() {
        let mut source = Trickle {
            data: b"abcdef".to_vec(),
            pos: 0,
            interrupt_next: false,
        };
        let mut sink = Vec::new();
        let copied = ChunkedCopier::default()
            .copy(&mut source, &mut sink)
            .expect("copy with interruptions");
        assert_eq!(copied, 6);
        assert_eq!(sink, b"abcdef");
    }

    #[test]
    fn empty_source_copies_nothing() {
        let mut sink = Vec::new();
        let mut calls = 0;
        let copied = ChunkedCopier::default()
            .copy_with_tap(&mut io::empty(), &mut sink, |_| calls += 1)
            .expect("empty copy");
        assert_eq!(copied, 0);
        assert_eq!(calls, 0);
    }

    #[test]
    fn chunk_size_rejects_zero_in_config() {
        let parsed: Result<ChunkSize, _> = serde_json::from_str("0");
        assert!(parsed.is_err());
        let parsed: ChunkSize = serde_json::from_str("4096").expect("valid size");
        assert_eq!(parsed.get(), 4096);
    }
}
