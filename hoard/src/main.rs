//! hoard CLI entrypoint.
//!
//! This binary archives, restores, lists, and verifies files in a
//! content-addressed store. Command results go to stdout; progress, log
//! records, and errors go to stderr.

use clap::Parser;
use hoard::cli::Cli;
use hoard::commands::{run, write_stderr_line};
use hoard::error::Result;
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the log filter chosen by `-v`/`-q`.
const LOG_ENV: &str = "HOARD_LOG";

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbosity, cli.global.quiet);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Install a stderr log subscriber that also receives `log` records.
fn init_logging(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity, quiet)));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
    if installed.is_err() {
        // A subscriber is already installed; keep it.
    }
}

/// Map `-v` count and `-q` to a log level directive.
const fn level_for(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn exit_code_for_run_result(result: Result<i32>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(code) => code,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            err.exit_code()
        }
    }
}
