//! CLI argument definitions for hoard.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::codec::Codec;
use crate::config::ConfigOverrides;
use crate::digest::DigestAlgorithm;
use crate::naming::NamingPolicy;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Deduplicate, compress, and register files in a content-addressed store.
#[derive(Parser, Debug)]
#[command(name = "hoard")]
#[command(version, about)]
#[command(long_about = concat!(
    "Deduplicate, compress, and register files in a content-addressed store.\n\n",
    "Each file is digested, compared with the store's manifest, and either ",
    "reported as already stored, rejected as a name conflict, or compressed ",
    "into the store and recorded in registry.json.",
))]
#[command(after_help = concat!(
    "EXIT STATUS:\n",
    "  0   success (stored or already stored)\n",
    "  1   verify found missing or damaged artifacts\n",
    "  3   the name is registered with different content\n",
    "  65  corrupt manifest or digest mismatch\n",
    "  66  input file or manifest entry not found\n",
    "  73  store write failure or artifact name collision\n",
    "  74  manifest or artifact could not be read\n",
    "  75  store locked by another process\n",
    "  78  invalid configuration\n\n",
    "EXAMPLES:\n",
    "  Archive a file:\n",
    "    $ hoard add docs/report.pdf\n\n",
    "  Restore it elsewhere:\n",
    "    $ hoard extract docs/report.pdf -o /tmp/report.pdf\n\n",
    "  Show the manifest as JSON:\n",
    "    $ hoard list --json\n\n",
    "  Use a zstd store in another directory:\n",
    "    $ hoard --store /srv/archive --codec zstd add notes.txt",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ingest a file into the store.
    Add(AddArgs),

    /// Restore a stored file.
    Extract(ExtractArgs),

    /// Show manifest entries.
    List(ListArgs),

    /// Re-check every stored artifact against its recorded digest.
    Verify,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Store directory [default: store].
    #[arg(short, long, value_name = "DIR", global = true)]
    pub store: Option<Utf8PathBuf>,

    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Codec for new artifacts [default: xz].
    #[arg(long, value_enum, global = true)]
    pub codec: Option<Codec>,

    /// Digest algorithm recorded in the manifest [default: sha1].
    #[arg(long, value_enum, global = true)]
    pub digest: Option<DigestAlgorithm>,

    /// Artifact naming policy [default: base-name].
    #[arg(long, value_enum, global = true)]
    pub naming: Option<NamingPolicy>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet",
        global = true
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity", global = true)]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Return the settings given on the command line as config overrides.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            store_dir: self.store.clone(),
            codec: self.codec,
            digest: self.digest,
            naming: self.naming,
        }
    }
}

/// Arguments for the add command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AddArgs {
    /// File to ingest. The path as given becomes its name in the manifest.
    #[arg(value_name = "FILE")]
    pub file: Utf8PathBuf,
}

/// Arguments for the extract command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ExtractArgs {
    /// Name of the entry, as it was given to `add`.
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Output path [default: base name of NAME in the current directory].
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,
}

/// Arguments for the list command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    /// Output in JSON format.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
