//! User-facing messages for the hoard CLI.
//!
//! Progress lines describe [`IngestEvent`]s as they happen; the remaining
//! helpers summarise the result of each command.

use crate::engine::{IngestEvent, Outcome, VerifyReport};
use crate::registry::FileEntry;
use camino::Utf8Path;

/// Describe an ingestion progress event.
///
/// # Examples
///
/// ```
/// use hoard::codec::Codec;
/// use hoard::engine::IngestEvent;
/// use hoard::output::progress_line;
///
/// let line = progress_line(&IngestEvent::Compressing {
///     stored_name: "a.txt.xz".to_owned(),
///     codec: Codec::Xz,
/// });
/// assert_eq!(line, "Compressing to a.txt.xz (xz)...");
/// ```
#[must_use]
pub fn progress_line(event: &IngestEvent) -> String {
    match event {
        IngestEvent::DigestingOriginal { path } => format!("Digesting {path}..."),
        IngestEvent::OriginalDigest { digest } => format!("  original digest {digest}"),
        IngestEvent::Compressing { stored_name, codec } => {
            format!("Compressing to {stored_name} ({codec})...")
        }
        IngestEvent::StoredDigest { digest } => format!("  stored digest {digest}"),
        IngestEvent::Registered { entry } => {
            format!("Registered {}", entry.original_name())
        }
    }
}

/// Summarise the outcome of ingesting `input`.
#[must_use]
pub fn outcome_message(input: &Utf8Path, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Stored { entry } => format!("stored {input} as {}", entry.stored_name()),
        Outcome::AlreadyStored { entry } => {
            format!("{input} is already stored as {}", entry.stored_name())
        }
        Outcome::NameConflict {
            existing_digest,
            incoming_digest,
        } => format!(
            concat!(
                "{} is already registered with different content\n",
                "  registered: {}\n",
                "  offered:    {}"
            ),
            input, existing_digest, incoming_digest
        ),
    }
}

/// Confirm a successful extraction.
#[must_use]
pub fn extract_message(entry: &FileEntry, destination: &Utf8Path) -> String {
    format!("restored {} to {destination}", entry.original_name())
}

/// Summarise a verification run, one line per problem.
///
/// # Examples
///
/// ```
/// use hoard::engine::VerifyReport;
/// use hoard::output::verify_summary;
///
/// assert_eq!(verify_summary(&VerifyReport::default()), "verified 0 entries: all ok");
/// ```
#[must_use]
pub fn verify_summary(report: &VerifyReport) -> String {
    if report.is_clean() {
        return format!("verified {} entries: all ok", report.checked());
    }

    let mut output = format!(
        "verified {} entries: {} problem(s)",
        report.checked(),
        report.problems().len()
    );
    for problem in report.problems() {
        output.push_str(&format!("\n  {problem}"));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{ContentDigest, DigestAlgorithm};

    fn digest(hex: &str) -> ContentDigest {
        ContentDigest::parse_for(hex, DigestAlgorithm::Sha1).expect("valid sha1")
    }

    fn entry() -> FileEntry {
        FileEntry::new(
            "docs/a.txt",
            digest("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"),
            "a.txt.xz",
            digest("7c211433f02071597741e6ff5a8ea34789abbf43"),
        )
    }

    #[test]
    fn stored_outcome_names_the_artifact() {
        let message = outcome_message(
            Utf8Path::new("docs/a.txt"),
            &Outcome::Stored { entry: entry() },
        );
        assert_eq!(message, "stored docs/a.txt as a.txt.xz");
    }

    #[test]
    fn conflict_outcome_shows_both_digests() {
        let message = outcome_message(
            Utf8Path::new("docs/a.txt"),
            &Outcome::NameConflict {
                existing_digest: digest("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"),
                incoming_digest: digest("7c211433f02071597741e6ff5a8ea34789abbf43"),
            },
        );
        assert!(message.contains("different content"));
        assert!(message.contains("registered: aaf4c61d"));
        assert!(message.contains("offered:    7c211433"));
    }

    #[test]
    fn registered_event_names_the_entry() {
        let line = progress_line(&IngestEvent::Registered { entry: entry() });
        assert_eq!(line, "Registered docs/a.txt");
    }

    #[test]
    fn extract_message_names_destination() {
        let message = extract_message(&entry(), Utf8Path::new("/tmp/a.txt"));
        assert_eq!(message, "restored docs/a.txt to /tmp/a.txt");
    }
}
