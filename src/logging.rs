//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! The level comes from, in priority order:
//!
//! 1. `RUST_LOG` (if set, used verbatim)
//! 2. `--quiet` (errors only) or `-v`/`-vv` (debug/trace)
//! 3. Info
//!
//! Logs go to stderr so they never interleave with the report on stdout.
//! Debug builds prefix every line with a timestamp.

use std::env;
use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Install the global logger for this process.
///
/// Returns `false` if a logger was already installed, which happens when
/// several in-process runs share one test binary.
///
/// ```rust,no_run
/// use dupesieve::logging::init_logging;
///
/// init_logging(1, false);
/// log::debug!("visible with -v");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> bool {
    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    let from_env = env::var("RUST_LOG").is_ok();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }

    let with_module = verbose >= 1 || from_env;
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        if cfg!(debug_assertions) {
            let timestamp = buf.timestamp_seconds();
            write!(buf, "{timestamp} ")?;
        }
        if with_module {
            writeln!(
                buf,
                "{style}{:<5}{style:#} [{}] {}",
                record.level(),
                record.module_path().unwrap_or("?"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
        }
    });

    let installed = builder.try_init().is_ok();
    if installed {
        log::debug!("Logging initialized at level {}", log::max_level());
    }
    installed
}

/// Map CLI verbosity flags to a level filter. `quiet` wins over `verbose`.
fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
