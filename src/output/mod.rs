//! Output formatters for duplicate scan results.
//!
//! - Text for people
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::cli::OutputFormat;
//! use dupesieve::duplicates::DuplicateFinder;
//! use dupesieve::error::ExitCode;
//! use dupesieve::output::write_report;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! write_report(OutputFormat::Json, &groups, &summary, ExitCode::Success, false, std::io::stdout()).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::io::Write;

use anyhow::Result;

pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextOutput;

use crate::cli::OutputFormat;
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// Render the results of a scan in `format`.
///
/// `color` only affects the text format.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_report<W: Write>(
    format: OutputFormat,
    groups: &[DuplicateGroup],
    summary: &ScanSummary,
    exit_code: ExitCode,
    color: bool,
    mut writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Text => TextOutput::new(groups, summary)
            .with_color(color)
            .write_to(&mut writer)?,
        OutputFormat::Json => JsonOutput::new(groups, summary, exit_code).write_to(&mut writer)?,
        OutputFormat::Csv => CsvOutput::new(groups).write_to(&mut writer)?,
    }
    writer.flush()?;
    Ok(())
}
