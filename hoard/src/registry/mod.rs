//! Durable manifest of stored files.
//!
//! The registry is a JSON array of flat records, one per original file,
//! stored at `<store>/registry.json`. Records keep insertion order so the
//! manifest diffs cleanly between runs. Field names are configurable through
//! [`RecordKeys`] so manifests written by earlier tools (`orig_sha1`,
//! `stored_sha1`) stay readable. Fields outside the configured keys are
//! carried through unchanged when the manifest is rewritten.

mod record_keys;

pub use record_keys::RecordKeys;

use crate::digest::{ContentDigest, DigestAlgorithm};
use crate::error::{Result, StoreError};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, trace};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{ErrorKind, Write};
use tempfile::NamedTempFile;

/// File name of the manifest inside the store directory.
pub const REGISTRY_FILENAME: &str = "registry.json";

/// Return the manifest path for `store_dir`.
#[must_use]
pub fn manifest_path(store_dir: &Utf8Path) -> Utf8PathBuf {
    store_dir.join(REGISTRY_FILENAME)
}

/// One archived original file.
///
/// Entries are immutable once created; the registry never updates one in
/// place.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileEntry {
    original_name: String,
    original_digest: ContentDigest,
    stored_name: String,
    stored_digest: ContentDigest,
}

impl FileEntry {
    /// Create an entry from its four fields.
    #[must_use]
    pub fn new(
        original_name: impl Into<String>,
        original_digest: ContentDigest,
        stored_name: impl Into<String>,
        stored_digest: ContentDigest,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            original_digest,
            stored_name: stored_name.into(),
            stored_digest,
        }
    }

    /// Return the lookup key: the original path as given at ingestion.
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Return the digest of the original bytes.
    #[must_use]
    pub const fn original_digest(&self) -> &ContentDigest {
        &self.original_digest
    }

    /// Return the artifact file name inside the store directory.
    #[must_use]
    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    /// Return the digest of the compressed artifact.
    #[must_use]
    pub const fn stored_digest(&self) -> &ContentDigest {
        &self.stored_digest
    }
}

/// In-memory view of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    keys: RecordKeys,
    algorithm: DigestAlgorithm,
    entries: Vec<FileEntry>,
    /// Unrecognised fields of each record, index-aligned with `entries`.
    extras: Vec<Map<String, Value>>,
}

impl Registry {
    /// Create an empty registry that reads and writes records with `keys`.
    #[must_use]
    pub const fn new(keys: RecordKeys, algorithm: DigestAlgorithm) -> Self {
        Self {
            keys,
            algorithm,
            entries: Vec::new(),
            extras: Vec::new(),
        }
    }

    /// Load the manifest from `store_dir`.
    ///
    /// A missing manifest is the first-run state and yields an empty
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RegistryCorrupt`] if the manifest is not a JSON
    /// array of records with the configured string fields, if a digest does
    /// not match `algorithm`, or if two records share an original name.
    /// Returns [`StoreError::RegistryUnreadable`] if the file exists but
    /// cannot be read.
    pub fn load(store_dir: &Utf8Path, keys: RecordKeys, algorithm: DigestAlgorithm) -> Result<Self> {
        let path = manifest_path(store_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                info!("{path} not found, starting a new registry");
                return Ok(Self::new(keys, algorithm));
            }
            Err(source) => return Err(StoreError::RegistryUnreadable { path, source }),
        };

        let mut registry = Self::new(keys, algorithm);
        let records = registry.parse(&content).map_err(|reason| {
            StoreError::RegistryCorrupt {
                path: path.clone(),
                reason,
            }
        })?;
        (registry.entries, registry.extras) = records.into_iter().unzip();
        debug!("loaded {} entries from {path}", registry.entries.len());
        Ok(registry)
    }

    /// Find the entry registered under `original_name`.
    #[must_use]
    pub fn lookup(&self, original_name: &str) -> Option<&FileEntry> {
        self.entries
            .iter()
            .find(|entry| entry.original_name == original_name)
    }

    /// Find the entry that owns the artifact `stored_name`.
    #[must_use]
    pub fn lookup_stored(&self, stored_name: &str) -> Option<&FileEntry> {
        self.entries
            .iter()
            .find(|entry| entry.stored_name == stored_name)
    }

    /// Append a new entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if an entry with the same
    /// original name already exists. Callers are expected to
    /// [`lookup`](Self::lookup) first, so this indicates a logic defect.
    pub fn append(&mut self, entry: FileEntry) -> Result<()> {
        if self.lookup(&entry.original_name).is_some() {
            return Err(StoreError::DuplicateKey {
                name: entry.original_name,
            });
        }
        trace!("registering {}", entry.original_name);
        self.entries.push(entry);
        self.extras.push(Map::new());
        Ok(())
    }

    /// Atomically replace the manifest in `store_dir` with this registry.
    ///
    /// The document is written to a temporary file in the same directory,
    /// synced, and renamed over the manifest, so readers observe either the
    /// old or the new manifest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StoreWriteFailure`] if any step fails. The
    /// previous manifest is left intact in that case.
    pub fn persist(&self, store_dir: &Utf8Path) -> Result<()> {
        let path = manifest_path(store_dir);
        info!("saving {path}");
        let json = serde_json::to_string_pretty(&self.to_json())
            .map_err(|e| StoreError::write_failure(&path, std::io::Error::other(e)))?;

        let mut temp =
            NamedTempFile::new_in(store_dir).map_err(|e| StoreError::write_failure(&path, e))?;
        temp.write_all(json.as_bytes())
            .and_then(|()| temp.write_all(b"\n"))
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| StoreError::write_failure(&path, e))?;
        temp.persist(&path)
            .map_err(|e| StoreError::write_failure(&path, e.error))?;
        sync_dir(store_dir);
        Ok(())
    }

    /// Return all entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Consume the registry and return its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<FileEntry> {
        self.entries
    }

    /// Return the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true when no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the record keys used for serialisation.
    #[must_use]
    pub const fn keys(&self) -> &RecordKeys {
        &self.keys
    }

    fn parse(
        &self,
        content: &str,
    ) -> std::result::Result<Vec<(FileEntry, Map<String, Value>)>, String> {
        let records: Vec<Map<String, Value>> = serde_json::from_str(content)
            .map_err(|e| format!("expected a JSON array of records: {e}"))?;

        let mut parsed: Vec<(FileEntry, Map<String, Value>)> = Vec::with_capacity(records.len());
        for (index, mut record) in records.into_iter().enumerate() {
            let entry = self
                .parse_record(&record)
                .map_err(|e| format!("record {index}: {e}"))?;
            if parsed
                .iter()
                .any(|(seen, _)| seen.original_name == entry.original_name)
            {
                return Err(format!(
                    "record {index}: duplicate entry for {}",
                    entry.original_name
                ));
            }
            for key in self.keys.all() {
                record.remove(key);
            }
            parsed.push((entry, record));
        }
        Ok(parsed)
    }

    fn parse_record(&self, record: &Map<String, Value>) -> std::result::Result<FileEntry, String> {
        let digest = |key: &str| -> std::result::Result<ContentDigest, String> {
            ContentDigest::parse_for(string_field(record, key)?, self.algorithm)
                .map_err(|e| format!("field \"{key}\": {e}"))
        };

        Ok(FileEntry {
            original_name: string_field(record, &self.keys.original_name)?.to_owned(),
            original_digest: digest(&self.keys.original_digest)?,
            stored_name: string_field(record, &self.keys.stored_name)?.to_owned(),
            stored_digest: digest(&self.keys.stored_digest)?,
        })
    }

    fn to_json(&self) -> Value {
        let records = self
            .entries
            .iter()
            .zip(&self.extras)
            .map(|(entry, extra)| {
                let mut record = extra.clone();
                record.insert(
                    self.keys.original_name.clone(),
                    Value::String(entry.original_name.clone()),
                );
                record.insert(
                    self.keys.original_digest.clone(),
                    Value::String(entry.original_digest.as_str().to_owned()),
                );
                record.insert(
                    self.keys.stored_name.clone(),
                    Value::String(entry.stored_name.clone()),
                );
                record.insert(
                    self.keys.stored_digest.clone(),
                    Value::String(entry.stored_digest.as_str().to_owned()),
                );
                Value::Object(record)
            })
            .collect();
        Value::Array(records)
    }
}

fn string_field<'a>(
    record: &'a Map<String, Value>,
    key: &str,
) -> std::result::Result<&'a str, String> {
    match record.get(key) {
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(_) => Err(format!("field \"{key}\" is not a string")),
        None => Err(format!("missing field \"{key}\"")),
    }
}

/// Flush directory metadata so the rename survives a crash.
///
/// Not every platform allows opening a directory; failures are logged and
/// otherwise ignored because the manifest itself is already durable.
fn sync_dir(dir: &Utf8Path) {
    if let Err(e) = File::open(dir).and_then(|handle| handle.sync_all()) {
        debug!("could not sync directory {dir}: {e}");
    }
}
