//! CSV output formatter for duplicate scan results.
//!
//! One row is generated for each file in a duplicate group. The header row
//! is always written, so an empty result is a header-only document.
//!
//! # Columns
//!
//! - `group_id`: 1-based index of the duplicate group
//! - `digest`: SHA-512 content digest (hexadecimal)
//! - `size`: File size in bytes
//! - `path`: Absolute path to the file

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicateGroup;

/// Column names, in output order.
pub const HEADER: [&str; 4] = ["group_id", "digest", "size", "path"];

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group_id: usize,
    digest: &'a str,
    size: u64,
    path: String,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(HEADER)?;

        for (idx, group) in self.groups.iter().enumerate() {
            for file in &group.files {
                csv_writer.serialize(CsvRow {
                    group_id: idx + 1,
                    digest: group.digest.as_str(),
                    size: group.size,
                    path: file.path().to_string_lossy().into_owned(),
                })?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }
}
