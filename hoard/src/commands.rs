//! Subcommand handlers.
//!
//! Each handler resolves the store configuration, runs one store operation,
//! and writes its result. Results go to `stdout`; progress and conflict
//! reports go to `stderr`. Handlers return the process exit status for
//! outcomes that are not errors.

use crate::cli::{AddArgs, Cli, Command, ExtractArgs, GlobalArgs, ListArgs};
use crate::config::StoreConfig;
use crate::engine::{IngestEvent, IngestObserver, Outcome, Store};
use crate::error::{EXIT_NAME_CONFLICT, EXIT_VERIFY_FAILED, Result, StoreError};
use crate::list_output::{format_human, format_json};
use crate::output::{extract_message, outcome_message, progress_line, verify_summary};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use std::io::Write;

/// Exit status for a successful command.
pub const EXIT_SUCCESS: i32 = 0;

/// Origin named in errors for settings that came from the command line.
const COMMAND_LINE: &str = "<command line>";

/// Run the parsed command line and return the process exit status.
///
/// # Errors
///
/// Returns the [`StoreError`] that aborted the command.
pub fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<i32> {
    let config = resolve_config(&cli.global)?;
    trace!("resolved configuration: {config:?}");
    match &cli.command {
        Command::Add(args) => run_add(config, args, cli.global.quiet, stdout, stderr),
        Command::Extract(args) => run_extract(config, args, stdout),
        Command::List(args) => run_list(config, args, stdout),
        Command::Verify => run_verify(config, stdout),
    }
}

/// Build the store configuration from the optional file and CLI overrides.
///
/// # Errors
///
/// Returns [`StoreError::Config`] if the configuration file is unusable or
/// the merged settings are invalid.
pub fn resolve_config(global: &GlobalArgs) -> Result<StoreConfig> {
    let base = match &global.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    let config = base.with_overrides(&global.overrides());
    config.validate(Utf8Path::new(COMMAND_LINE))?;
    Ok(config)
}

/// Reports ingestion progress on stderr.
struct ProgressReporter<'a> {
    stderr: &'a mut dyn Write,
}

impl IngestObserver for ProgressReporter<'_> {
    fn notify(&mut self, event: &IngestEvent) {
        write_stderr_line(self.stderr, progress_line(event));
    }
}

fn run_add(
    config: StoreConfig,
    args: &AddArgs,
    quiet: bool,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<i32> {
    let outcome = if quiet {
        Store::new(config).ingest(&args.file)?
    } else {
        Store::with_observer(config, ProgressReporter { stderr: &mut *stderr }).ingest(&args.file)?
    };

    let message = outcome_message(&args.file, &outcome);
    match outcome {
        Outcome::Stored { .. } | Outcome::AlreadyStored { .. } => {
            write_stdout_line(stdout, message)?;
            Ok(EXIT_SUCCESS)
        }
        Outcome::NameConflict { .. } => {
            write_stderr_line(stderr, message);
            Ok(EXIT_NAME_CONFLICT)
        }
    }
}

fn run_extract(config: StoreConfig, args: &ExtractArgs, stdout: &mut dyn Write) -> Result<i32> {
    let destination = match &args.output {
        Some(path) => path.clone(),
        None => default_destination(&args.name)?,
    };
    debug!("extracting {} to {destination}", args.name);
    let entry = Store::new(config).extract(&args.name, &destination)?;
    write_stdout_line(stdout, extract_message(&entry, &destination))?;
    Ok(EXIT_SUCCESS)
}

/// Return the base name of `name`, resolved against the current directory.
fn default_destination(name: &str) -> Result<Utf8PathBuf> {
    Utf8Path::new(name)
        .file_name()
        .map(Utf8PathBuf::from)
        .ok_or_else(|| StoreError::EntryNotFound {
            name: name.to_owned(),
        })
}

fn run_list(config: StoreConfig, args: &ListArgs, stdout: &mut dyn Write) -> Result<i32> {
    let entries = Store::new(config).entries()?;
    let output = if args.json {
        format_json(&entries)
    } else {
        format_human(&entries)
    };
    write_stdout_line(stdout, output)?;
    Ok(EXIT_SUCCESS)
}

fn run_verify(config: StoreConfig, stdout: &mut dyn Write) -> Result<i32> {
    let report = Store::new(config).verify()?;
    write_stdout_line(stdout, verify_summary(&report))?;
    Ok(if report.is_clean() {
        EXIT_SUCCESS
    } else {
        EXIT_VERIFY_FAILED
    })
}

fn write_stdout_line(stdout: &mut dyn Write, message: impl std::fmt::Display) -> Result<()> {
    writeln!(stdout, "{message}").map_err(|source| StoreError::OutputFailed { source })
}

/// Write a line to stderr, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use clap::Parser;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Sandbox {
        _temp: TempDir,
        root: Utf8PathBuf,
    }

    impl Sandbox {
        fn cli(&self, args: &[&str]) -> Cli {
            let store = self.root.join("store");
            let mut argv = vec!["hoard", "--store", store.as_str()];
            argv.extend_from_slice(args);
            Cli::parse_from(argv)
        }

        fn run(&self, args: &[&str]) -> (Result<i32>, String, String) {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            let result = run(&self.cli(args), &mut stdout, &mut stderr);
            (
                result,
                String::from_utf8(stdout).expect("utf-8 stdout"),
                String::from_utf8(stderr).expect("utf-8 stderr"),
            )
        }
    }

    #[fixture]
    fn sandbox() -> Sandbox {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp dir");
        Sandbox { _temp: temp, root }
    }

    #[rstest]
    fn add_reports_progress_and_outcome(sandbox: Sandbox) {
        let input = sandbox.root.join("a.txt");
        std::fs::write(&input, "hello").expect("write input");

        let (result, stdout, stderr) = sandbox.run(&["add", input.as_str()]);

        assert_eq!(result.expect("add succeeds"), EXIT_SUCCESS);
        assert!(stdout.contains("as a.txt.xz"), "{stdout}");
        assert!(stderr.contains("Compressing to a.txt.xz (xz)..."), "{stderr}");
    }

    #[rstest]
    fn quiet_add_suppresses_progress(sandbox: Sandbox) {
        let input = sandbox.root.join("a.txt");
        std::fs::write(&input, "hello").expect("write input");

        let (result, _, stderr) = sandbox.run(&["-q", "add", input.as_str()]);

        assert_eq!(result.expect("add succeeds"), EXIT_SUCCESS);
        assert!(stderr.is_empty(), "{stderr}");
    }

    #[rstest]
    fn conflicting_add_exits_with_conflict_status(sandbox: Sandbox) {
        let input = sandbox.root.join("a.txt");
        std::fs::write(&input, "hello").expect("write input");
        sandbox.run(&["-q", "add", input.as_str()]).0.expect("first add");
        std::fs::write(&input, "world").expect("rewrite input");

        let (result, _, stderr) = sandbox.run(&["-q", "add", input.as_str()]);

        assert_eq!(result.expect("conflict is not an error"), EXIT_NAME_CONFLICT);
        assert!(stderr.contains("different content"), "{stderr}");
    }

    #[rstest]
    fn verify_on_empty_store_is_clean(sandbox: Sandbox) {
        let (result, stdout, _) = sandbox.run(&["verify"]);
        assert_eq!(result.expect("verify"), EXIT_SUCCESS);
        assert!(stdout.contains("verified 0 entries"));
    }

    #[rstest]
    fn list_json_on_empty_store(sandbox: Sandbox) {
        let (result, stdout, _) = sandbox.run(&["list", "--json"]);
        assert_eq!(result.expect("list"), EXIT_SUCCESS);
        assert!(stdout.contains("\"entries\": []"), "{stdout}");
    }

    #[rstest]
    fn config_file_is_merged_with_flags(sandbox: Sandbox) {
        let config_path = sandbox.root.join("hoard.toml");
        std::fs::write(&config_path, "codec = \"gzip\"\ndigest = \"sha256\"\n").expect("config");
        let cli = sandbox.cli(&["--config", config_path.as_str(), "--codec", "zstd", "list"]);

        let config = resolve_config(&cli.global).expect("valid config");

        assert_eq!(config.codec, Codec::Zstd);
        assert_eq!(config.store_dir, sandbox.root.join("store"));
        assert_eq!(config.record_keys().original_digest, "orig_sha256");
    }

    #[rstest]
    fn broken_config_file_is_reported(sandbox: Sandbox) {
        let config_path = sandbox.root.join("hoard.toml");
        std::fs::write(&config_path, "colour = \"blue\"\n").expect("config");

        let (result, _, _) = sandbox.run(&["--config", config_path.as_str(), "list"]);

        assert!(matches!(result, Err(StoreError::Config { .. })));
    }

    #[rstest]
    #[case::nested("docs/a.txt", "a.txt")]
    #[case::plain("a.txt", "a.txt")]
    fn default_destination_uses_base_name(#[case] name: &str, #[case] expected: &str) {
        let destination = default_destination(name).expect("has a base name");
        assert_eq!(destination, Utf8PathBuf::from(expected));
    }

    #[test]
    fn default_destination_rejects_names_without_base() {
        assert!(matches!(
            default_destination(".."),
            Err(StoreError::EntryNotFound { .. })
        ));
    }
}
