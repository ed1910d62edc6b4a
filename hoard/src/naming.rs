//! Stored artifact naming policy.
//!
//! The default policy reproduces the historical layout,
//! `<base name>.<codec extension>`, which collides when two inputs share a
//! base name. The path-hash policy mixes a short digest of the full original
//! name into the artifact name to keep them apart.

use crate::codec::Codec;
use crate::digest::DigestAlgorithm;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// Number of hex characters of the path digest kept in path-hash names.
const PATH_HASH_LEN: usize = 12;

/// How an artifact file name is derived from the original name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NamingPolicy {
    /// `<base name>.<ext>`.
    #[default]
    BaseName,
    /// `<base name>-<12 hex of SHA-256(original name)>.<ext>`.
    PathHash,
}

impl NamingPolicy {
    /// Derive the artifact file name for `original_name`.
    ///
    /// Returns `None` when the name has no final component (for example
    /// `..` or a bare root), since there is nothing to base the artifact on.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use hoard::codec::Codec;
    /// use hoard::naming::NamingPolicy;
    ///
    /// let name = NamingPolicy::BaseName.stored_name(Utf8Path::new("docs/a.txt"), Codec::Xz);
    /// assert_eq!(name.as_deref(), Some("a.txt.xz"));
    /// ```
    #[must_use]
    pub fn stored_name(self, original_name: &Utf8Path, codec: Codec) -> Option<String> {
        let base = original_name.file_name()?;
        let ext = codec.extension();
        Some(match self {
            Self::BaseName => format!("{base}.{ext}"),
            Self::PathHash => {
                let mut stream = DigestAlgorithm::Sha256.stream();
                stream.update(original_name.as_str().as_bytes());
                let digest = stream.finalize();
                format!("{base}-{}.{ext}", digest.prefix(PATH_HASH_LEN))
            }
        })
    }
}
