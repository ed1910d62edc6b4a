//! Streaming compression codecs for stored artifacts.
//!
//! Encoders and decoders wrap an ordinary writer or reader, so the
//! [`ChunkedCopier`](crate::copier::ChunkedCopier) can drive them one chunk at
//! a time. The codec also fixes the artifact file extension.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, BufReader, Read, Write};

/// xz preset used for new artifacts; matches the `xz` command-line default.
const XZ_PRESET: u32 = 6;

/// zstd level used for new artifacts; `0` selects the library default.
const ZSTD_LEVEL: i32 = 0;

/// Supported artifact codecs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// LZMA2 in the `.xz` container.
    #[default]
    Xz,
    /// Zstandard frames.
    Zstd,
    /// DEFLATE in the gzip container.
    Gzip,
}

/// A compressing writer that must be finished explicitly.
///
/// Dropping an encoder without calling [`CompressWriter::finish`] may lose
/// the trailing frame, leaving an artifact that cannot be decoded.
pub trait CompressWriter<W>: Write {
    /// Flush the trailing frame and return the inner writer.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing the trailer.
    fn finish(self: Box<Self>) -> io::Result<W>;
}

impl<W: Write> CompressWriter<W> for xz2::write::XzEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<W> {
        xz2::write::XzEncoder::finish(*self)
    }
}

impl<W: Write> CompressWriter<W> for zstd::Encoder<'static, W> {
    fn finish(self: Box<Self>) -> io::Result<W> {
        zstd::Encoder::finish(*self)
    }
}

impl<W: Write> CompressWriter<W> for flate2::write::GzEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<W> {
        flate2::write::GzEncoder::finish(*self)
    }
}

impl Codec {
    /// Return the artifact file extension, without the leading dot.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoard::codec::Codec;
    ///
    /// assert_eq!(Codec::Xz.extension(), "xz");
    /// assert_eq!(Codec::Zstd.extension(), "zst");
    /// ```
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Xz => "xz",
            Self::Zstd => "zst",
            Self::Gzip => "gz",
        }
    }

    /// Infer the codec from an artifact file name's extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoard::codec::Codec;
    ///
    /// assert_eq!(Codec::from_stored_name("a.txt.zst"), Some(Codec::Zstd));
    /// assert_eq!(Codec::from_stored_name("a.txt"), None);
    /// ```
    #[must_use]
    pub fn from_stored_name(stored_name: &str) -> Option<Self> {
        let (_, ext) = stored_name.rsplit_once('.')?;
        [Self::Xz, Self::Zstd, Self::Gzip]
            .into_iter()
            .find(|codec| codec.extension() == ext)
    }

    /// Wrap `writer` in a compressing encoder.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the codec cannot initialise its context.
    pub fn encoder<'a, W>(self, writer: W) -> io::Result<Box<dyn CompressWriter<W> + 'a>>
    where
        W: Write + 'a,
    {
        Ok(match self {
            Self::Xz => Box::new(xz2::write::XzEncoder::new(writer, XZ_PRESET)),
            Self::Zstd => Box::new(zstd::Encoder::new(writer, ZSTD_LEVEL)?),
            Self::Gzip => Box::new(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::default(),
            )),
        })
    }

    /// Wrap `reader` in a decompressing decoder.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the codec cannot initialise its context.
    pub fn decoder<'a, R>(self, reader: R) -> io::Result<Box<dyn Read + 'a>>
    where
        R: Read + 'a,
    {
        Ok(match self {
            Self::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Self::Zstd => Box::new(zstd::Decoder::with_buffer(BufReader::new(reader))?),
            Self::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
        })
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Xz => "xz",
            Self::Zstd => "zstd",
            Self::Gzip => "gzip",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copier::{ChunkSize, ChunkedCopier};
    use rstest::rstest;
    use std::io::Cursor;

    fn sample() -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog\n".repeat(500)
    }

    #[rstest]
    #[case::xz(Codec::Xz)]
    #[case::zstd(Codec::Zstd)]
    #[case::gzip(Codec::Gzip)]
    fn chunked_compression_is_reversible(#[case] codec: Codec) {
        let data = sample();
        let copier = ChunkedCopier::new(ChunkSize::new(97).expect("non-zero"));

        let mut encoder = codec.encoder(Vec::new()).expect("encoder");
        copier
            .copy(&mut Cursor::new(&data), &mut encoder)
            .expect("compress");
        let compressed = encoder.finish().expect("finish");
        assert!(compressed.len() < data.len(), "{codec} did not compress");

        let mut decoder = codec.decoder(Cursor::new(compressed)).expect("decoder");
        let mut restored = Vec::new();
        copier.copy(&mut decoder, &mut restored).expect("decompress");
        assert_eq!(restored, data);
    }

    #[rstest]
    #[case::xz(Codec::Xz)]
    #[case::zstd(Codec::Zstd)]
    #[case::gzip(Codec::Gzip)]
    fn empty_input_still_produces_a_valid_container(#[case] codec: Codec) {
        let encoder = codec.encoder(Vec::new()).expect("encoder");
        let compressed = encoder.finish().expect("finish");
        assert!(!compressed.is_empty());

        let mut restored = Vec::new();
        codec
            .decoder(Cursor::new(compressed))
            .expect("decoder")
            .read_to_end(&mut restored)
            .expect("decode");
        assert!(restored.is_empty());
    }

    #[test]
    fn xz_output_starts_with_container_magic() {
        let mut encoder = Codec::Xz.encoder(Vec::new()).expect("encoder");
        encoder.write_all(b"hello").expect("write");
        let compressed = encoder.finish().expect("finish");
        assert!(compressed.starts_with(&[0xFD, b'7', b'z', b'X', b'Z', 0x00]));
    }

    #[test]
    fn codec_names_parse_from_config() {
        let codec: Codec = serde_json::from_str("\"zstd\"").expect("known codec");
        assert_eq!(codec, Codec::Zstd);
        assert!(serde_json::from_str::<Codec>("\"lz4\"").is_err());
    }
}
