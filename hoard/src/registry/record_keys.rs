//! Manifest field names.

use crate::digest::DigestAlgorithm;
use serde::{Deserialize, Serialize};

/// JSON field names used for each record in the manifest.
///
/// The defaults follow the `orig_*` / `stored_*` layout with the digest
/// algorithm name as suffix, so SHA-1 stores read and write `orig_sha1` and
/// `stored_sha1`.
///
/// # Examples
///
/// ```
/// use hoard::digest::DigestAlgorithm;
/// use hoard::registry::RecordKeys;
///
/// let keys = RecordKeys::for_algorithm(DigestAlgorithm::Sha256);
/// assert_eq!(keys.original_digest, "orig_sha256");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordKeys {
    /// Field holding the original name.
    pub original_name: String,
    /// Field holding the digest of the original bytes.
    pub original_digest: String,
    /// Field holding the artifact file name.
    pub stored_name: String,
    /// Field holding the digest of the artifact bytes.
    pub stored_digest: String,
}

impl RecordKeys {
    /// Return the conventional field names for `algorithm`.
    #[must_use]
    pub fn for_algorithm(algorithm: DigestAlgorithm) -> Self {
        let suffix = algorithm.name();
        Self {
            original_name: "orig_name".to_owned(),
            original_digest: format!("orig_{suffix}"),
            stored_name: "stored_name".to_owned(),
            stored_digest: format!("stored_{suffix}"),
        }
    }

    /// Return the four field names in record order.
    #[must_use]
    pub fn all(&self) -> [&str; 4] {
        [
            self.original_name.as_str(),
            self.original_digest.as_str(),
            self.stored_name.as_str(),
            self.stored_digest.as_str(),
        ]
    }

    /// Return the first field name that appears more than once, if any.
    ///
    /// Two logical fields sharing a JSON key would overwrite each other on
    /// write.
    #[must_use]
    pub fn first_duplicate(&self) -> Option<&str> {
        let names = self.all();
        names
            .iter()
            .enumerate()
            .find(|(index, name)| names.iter().skip(index + 1).any(|other| other == *name))
            .map(|(_, name)| *name)
    }
}

impl Default for RecordKeys {
    fn default() -> Self {
        Self::for_algorithm(DigestAlgorithm::default())
    }
}
