//! dupesieve - duplicate file finder
//!
//! Finds files with identical content under a directory by narrowing the
//! candidate set in three stages: byte size, an XXH3 fingerprint of a small
//! window in the middle of each file, and a SHA-512 digest of the whole file.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use cli::{Cli, Commands, OutputFormat, ScanArgs};
use config::Config;
use duplicates::DuplicateFinder;
use error::ExitCode;
use progress::Progress;

/// Run the command described by `cli`, writing the report to stdout.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the root cannot be scanned,
/// or a fatal hashing error occurs. The caller maps it to an exit code with
/// [`ExitCode::for_error`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    run_app_to(cli, io::stdout().lock())
}

/// Like [`run_app`], writing the report to `out`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_app_to<W: Write>(cli: Cli, mut out: W) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Config => {
            out.write_all(config.to_toml()?.as_bytes())?;
            out.flush()?;
            Ok(ExitCode::Success)
        }
        Commands::Scan(ref args) => {
            let config = config.with_scan_args(args)?;
            run_scan(args, &config, cli.quiet, !cli.no_color, out)
        }
    }
}

fn run_scan<W: Write>(
    args: &ScanArgs,
    config: &Config,
    quiet: bool,
    color: bool,
    out: W,
) -> Result<ExitCode> {
    let root = args.root();
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler();
    let mut finder_config = config
        .finder_config(args.min_size, args.max_size)
        .with_shutdown_flag(handler.get_flag());

    let show_progress = !quiet && config.output == OutputFormat::Text;
    if show_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = finder
        .find_duplicates(&root)
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    let exit_code = ExitCode::for_summary(&summary);

    output::write_report(config.output, &groups, &summary, exit_code, color, out)?;
    Ok(exit_code)
}
