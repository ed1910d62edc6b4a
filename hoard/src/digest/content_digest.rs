//! Hex digest newtype shared by every digest algorithm.
//!
//! Validates that the value is non-empty, even-length, lowercase
//! hexadecimal. Length checks against a specific algorithm happen in
//! [`ContentDigest::parse_for`].

use super::DigestAlgorithm;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors arising from malformed digest strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// The value is not well-formed lowercase hexadecimal.
    #[error("invalid digest \"{value}\": {reason}")]
    Malformed {
        /// The rejected string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// The value is hex of the wrong length for the algorithm in use.
    #[error("{algorithm} digest must be {expected} hex characters, got {actual}")]
    WrongLength {
        /// The algorithm the digest was checked against.
        algorithm: DigestAlgorithm,
        /// Expected number of hex characters.
        expected: usize,
        /// Observed number of hex characters.
        actual: usize,
    },
}

/// A validated lowercase hex digest.
///
/// # Examples
///
/// ```
/// use hoard::digest::ContentDigest;
///
/// let digest = ContentDigest::try_from("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d")
///     .expect("valid hex");
/// assert_eq!(digest.as_str().len(), 40);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Parse `value` and check it has the length `algorithm` produces.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Malformed`] for non-hex input and
    /// [`DigestError::WrongLength`] when the length does not match.
    pub fn parse_for(value: &str, algorithm: DigestAlgorithm) -> Result<Self, DigestError> {
        let digest = Self::try_from(value)?;
        let expected = algorithm.hex_len();
        if digest.0.len() != expected {
            return Err(DigestError::WrongLength {
                algorithm,
                expected,
                actual: digest.0.len(),
            });
        }
        Ok(digest)
    }

    /// Wrap the `{:x}` rendering of a finished hash.
    ///
    /// Hash output formatted with `LowerHex` is always valid, so no checks
    /// run here.
    pub(crate) const fn from_lower_hex(hex: String) -> Self {
        Self(hex)
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the first `len` hex characters, or the whole digest if shorter.
    #[must_use]
    pub fn prefix(&self, len: usize) -> &str {
        self.0.get(..len).unwrap_or(&self.0)
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<&str> for ContentDigest {
    type Error = DigestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_hex(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_hex(&value)?;
        Ok(Self(value))
    }
}

impl From<ContentDigest> for String {
    fn from(value: ContentDigest) -> Self {
        value.0
    }
}

impl AsRef<str> for ContentDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_hex(value: &str) -> Result<(), DigestError> {
    let malformed = |reason: &str| DigestError::Malformed {
        value: value.to_owned(),
        reason: reason.to_owned(),
    };
    if value.is_empty() {
        return Err(malformed("digest is empty"));
    }
    if !value.len().is_multiple_of(2) {
        return Err(malformed("odd number of hex characters"));
    }
    if value.chars().any(|c| !c.is_ascii_hexdigit()) {
        return Err(malformed("non-hex character"));
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(malformed("digest must be lowercase"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::empty("")]
    #[case::odd("abc")]
    #[case::non_hex("zz")]
    #[case::uppercase("AB")]
    fn rejects_malformed_values(#[case] value: &str) {
        assert!(matches!(
            ContentDigest::try_from(value),
            Err(DigestError::Malformed { .. })
        ));
    }

    #[test]
    fn parse_for_checks_algorithm_length() {
        let sha256_hex = "a".repeat(64);
        let err = ContentDigest::parse_for(&sha256_hex, DigestAlgorithm::Sha1)
            .expect_err("sha256 length is wrong for sha1");
        assert_eq!(
            err,
            DigestError::WrongLength {
                algorithm: DigestAlgorithm::Sha1,
                expected: 40,
                actual: 64,
            }
        );
        assert!(ContentDigest::parse_for(&sha256_hex, DigestAlgorithm::Sha256).is_ok());
    }

    #[test]
    fn serde_uses_plain_string_form() {
        let digest = ContentDigest::try_from("00abff").expect("valid");
        let json = serde_json::to_string(&digest).expect("serialize");
        assert_eq!(json, "\"00abff\"");
    }

    #[test]
    fn prefix_clamps_to_length() {
        let digest = ContentDigest::try_from("abcd").expect("valid");
        assert_eq!(digest.prefix(2), "ab");
        assert_eq!(digest.prefix(12), "abcd");
    }

    #[test]
    fn serde_rejects_invalid_hex() {
        let result: Result<ContentDigest, _> = serde_json::from_str("\"not-hex\"");
        assert!(result.is_err());
    }
}
