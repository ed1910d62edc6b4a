//! Output formatting for manifest listing.
//!
//! This module provides utilities to format manifest entries for
//! human-readable or JSON output.

use crate::registry::FileEntry;
use serde::Serialize;

/// Number of digest characters shown in the human-readable listing.
const SHORT_DIGEST_LEN: usize = 12;

/// Format manifest entries for human-readable output.
///
/// # Examples
///
/// ```
/// use hoard::list_output::format_human;
///
/// let output = format_human(&[]);
/// assert!(output.contains("No files stored"));
/// ```
#[must_use]
pub fn format_human(entries: &[FileEntry]) -> String {
    if entries.is_empty() {
        return String::from("No files stored.\n\nRun `hoard add <FILE>` to archive a file.");
    }

    let mut output = format!("Stored files ({}):\n", entries.len());
    for entry in entries {
        output.push_str(&format!(
            "\n  {}\n    artifact: {} ({})\n    original: {}\n",
            entry.original_name(),
            entry.stored_name(),
            entry.stored_digest().prefix(SHORT_DIGEST_LEN),
            entry.original_digest().prefix(SHORT_DIGEST_LEN),
        ));
    }
    output
}

/// Format manifest entries as JSON.
///
/// # Examples
///
/// ```
/// use hoard::list_output::format_json;
///
/// let json = format_json(&[]);
/// assert!(json.contains("\"entries\""));
/// ```
#[must_use]
pub fn format_json(entries: &[FileEntry]) -> String {
    let json_data = ManifestJson { entries };

    // Use pretty printing for readability
    serde_json::to_string_pretty(&json_data).unwrap_or_else(|_| "{}".to_owned())
}

/// JSON-serializable view of the manifest.
#[derive(Debug, Serialize)]
struct ManifestJson<'a> {
    entries: &'a [FileEntry],
}
