//! Store configuration.
//!
//! [`StoreConfig`] gathers everything an operation needs to know about the
//! store: where it lives, how artifacts are compressed and named, which
//! digest the manifest records, and the chunk sizes for each pass. It can be
//! loaded from a TOML file and then adjusted with command-line overrides.
//!
//! ```toml
//! store_dir = "archive"
//! codec = "zstd"
//! digest = "sha256"
//! naming = "path-hash"
//! copy_chunk_size = 16384
//!
//! [keys]
//! original_name = "name"
//! ```

use crate::codec::Codec;
use crate::copier::ChunkSize;
use crate::digest::DigestAlgorithm;
use crate::error::{Result, StoreError};
use crate::naming::NamingPolicy;
use crate::registry::RecordKeys;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::{Deserialize, Serialize};

/// Store directory used when neither the file nor the command line names one.
pub const DEFAULT_STORE_DIR: &str = "store";

/// Settings for a single store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding the manifest and artifacts.
    pub store_dir: Utf8PathBuf,
    /// Codec for new artifacts.
    pub codec: Codec,
    /// Digest algorithm recorded in the manifest.
    pub digest: DigestAlgorithm,
    /// How artifact names are derived.
    pub naming: NamingPolicy,
    /// Chunk size for compression and extraction passes.
    pub copy_chunk_size: ChunkSize,
    /// Chunk size for digest-only passes.
    pub digest_chunk_size: ChunkSize,
    /// Manifest field names. When absent, names follow the digest algorithm.
    pub keys: Option<RecordKeys>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_dir: Utf8PathBuf::from(DEFAULT_STORE_DIR),
            codec: Codec::default(),
            digest: DigestAlgorithm::default(),
            naming: NamingPolicy::default(),
            copy_chunk_size: ChunkSize::COPY_DEFAULT,
            digest_chunk_size: ChunkSize::DIGEST_DEFAULT,
            keys: None,
        }
    }
}

impl StoreConfig {
    /// Create a default configuration rooted at `store_dir`.
    #[must_use]
    pub fn for_dir(store_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
            ..Self::default()
        }
    }

    /// Read and validate a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the file cannot be read, is not
    /// valid TOML, contains unknown settings, or fails
    /// [`validate`](Self::validate).
    pub fn load(path: &Utf8Path) -> Result<Self> {
        debug!("reading configuration from {path}");
        let source = std::fs::read_to_string(path).map_err(|e| StoreError::Config {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&source, path)
    }

    /// Parse and validate configuration text; `origin` names it in errors.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the text does not describe a valid
    /// configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use hoard::codec::Codec;
    /// use hoard::config::StoreConfig;
    ///
    /// let config = StoreConfig::from_toml("codec = \"gzip\"", Utf8Path::new("hoard.toml"))
    ///     .expect("valid configuration");
    /// assert_eq!(config.codec, Codec::Gzip);
    /// assert_eq!(config.store_dir.as_str(), "store");
    /// ```
    pub fn from_toml(source: &str, origin: &Utf8Path) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| StoreError::Config {
            path: origin.to_owned(),
            reason: e.message().to_owned(),
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    /// Check settings that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] when the store directory is empty, a
    /// chunk size exceeds [`ChunkSize::MAX_BYTES`], or two manifest fields
    /// share a name.
    pub fn validate(&self, origin: &Utf8Path) -> Result<()> {
        let fail = |reason: String| StoreError::Config {
            path: origin.to_owned(),
            reason,
        };
        if self.store_dir.as_str().is_empty() {
            return Err(fail("store_dir must not be empty".to_owned()));
        }
        for (field, size) in [
            ("copy_chunk_size", self.copy_chunk_size),
            ("digest_chunk_size", self.digest_chunk_size),
        ] {
            if size.get() > ChunkSize::MAX_BYTES {
                return Err(fail(format!(
                    "{field} is {size}, the limit is {} bytes",
                    ChunkSize::MAX_BYTES
                )));
            }
        }
        if let Some(name) = self.keys.as_ref().and_then(RecordKeys::first_duplicate) {
            return Err(fail(format!("manifest field \"{name}\" is used twice")));
        }
        Ok(())
    }

    /// Return the manifest field names in effect.
    #[must_use]
    pub fn record_keys(&self) -> RecordKeys {
        self.keys
            .clone()
            .unwrap_or_else(|| RecordKeys::for_algorithm(self.digest))
    }

    /// Apply command-line overrides on top of file or default values.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(store_dir) = &overrides.store_dir {
            self.store_dir.clone_from(store_dir);
        }
        if let Some(codec) = overrides.codec {
            self.codec = codec;
        }
        if let Some(digest) = overrides.digest {
            self.digest = digest;
        }
        if let Some(naming) = overrides.naming {
            self.naming = naming;
        }
        self
    }
}

/// Settings supplied on the command line, each taking precedence when set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Replacement store directory.
    pub store_dir: Option<Utf8PathBuf>,
    /// Replacement codec.
    pub codec: Option<Codec>,
    /// Replacement digest algorithm.
    pub digest: Option<DigestAlgorithm>,
    /// Replacement naming policy.
    pub naming: Option<NamingPolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn origin() -> &'static Utf8Path {
        Utf8Path::new("hoard.toml")
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = StoreConfig::from_toml("", origin()).expect("empty config");
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.record_keys(), RecordKeys::default());
    }

    #[test]
    fn full_file_is_parsed() {
        let source = r#"
            store_dir = "archive"
            codec = "zstd"
            digest = "sha256"
            naming = "path-hash"
            copy_chunk_size = 16384
            digest_chunk_size = 1024
        "#;
        let config = StoreConfig::from_toml(source, origin()).expect("valid config");
        assert_eq!(config.store_dir, Utf8PathBuf::from("archive"));
        assert_eq!(config.codec, Codec::Zstd);
        assert_eq!(config.digest, DigestAlgorithm::Sha256);
        assert_eq!(config.naming, NamingPolicy::PathHash);
        assert_eq!(config.copy_chunk_size.get(), 16384);
        assert_eq!(config.digest_chunk_size.get(), 1024);
        assert_eq!(config.record_keys().stored_digest, "stored_sha256");
    }

    #[test]
    fn partial_key_table_keeps_other_defaults() {
        let source = "[keys]\noriginal_name = \"name\"\n";
        let config = StoreConfig::from_toml(source, origin()).expect("valid config");
        let keys = config.record_keys();
        assert_eq!(keys.original_name, "name");
        assert_eq!(keys.original_digest, "orig_sha1");
    }

    #[rstest]
    #[case::unknown_field("colour = \"blue\"")]
    #[case::unknown_codec("codec = \"lz4\"")]
    #[case::zero_chunk("copy_chunk_size = 0")]
    #[case::huge_copy_chunk("copy_chunk_size = 1099511627776000")]
    #[case::huge_digest_chunk("digest_chunk_size = 67108865")]
    #[case::empty_store("store_dir = \"\"")]
    #[case::duplicate_keys("[keys]\noriginal_name = \"stored_name\"")]
    #[case::not_toml("codec = ")]
    fn invalid_files_are_config_errors(#[case] source: &str) {
        let err = StoreConfig::from_toml(source, origin()).expect_err("invalid config");
        assert!(matches!(err, StoreError::Config { .. }), "unexpected: {err}");
        assert!(err.to_string().contains("hoard.toml"));
    }

    #[test]
    fn largest_chunk_size_is_accepted() {
        let source = format!("copy_chunk_size = {}", ChunkSize::MAX_BYTES);
        let config = StoreConfig::from_toml(&source, origin()).expect("at the limit");
        assert_eq!(config.copy_chunk_size.get(), ChunkSize::MAX_BYTES);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = StoreConfig::load(Utf8Path::new("/nonexistent/hoard.toml"))
            .expect_err("missing file");
        assert!(matches!(err, StoreError::Config { .. }));
    }

    #[test]
    fn overrides_take_precedence() {
        let base = StoreConfig::from_toml("codec = \"gzip\"\ndigest = \"sha256\"", origin())
            .expect("valid config");
        let overrides = ConfigOverrides {
            store_dir: Some(Utf8PathBuf::from("elsewhere")),
            codec: Some(Codec::Xz),
            ..ConfigOverrides::default()
        };
        let merged = base.with_overrides(&overrides);
        assert_eq!(merged.store_dir, Utf8PathBuf::from("elsewhere"));
        assert_eq!(merged.codec, Codec::Xz);
        assert_eq!(merged.digest, DigestAlgorithm::Sha256);
    }
}
