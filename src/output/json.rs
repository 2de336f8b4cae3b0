//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "digest": "ddaf35a1...",
//!       "size": 1024,
//!       "files": ["/path/to/file1.txt", "/path/to/file2.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "size_groups": 12,
//!     "quickhash_groups": 6,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "exit_code": 0,
//!     "exit_code_name": "DS000"
//!   },
//!   "generated_at": "2024-01-01T00:00:00+00:00"
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// SHA-512 digest as 128 hex characters
    pub digest: String,
    /// File size in bytes
    pub size: u64,
    /// Member paths, in enumeration order
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            digest: group.digest.as_str().to_string(),
            size: group.size,
            files: group
                .files
                .iter()
                .map(|f| f.path().to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files enumerated
    pub total_files: usize,
    /// Bytes enumerated
    pub total_size: u64,
    /// Candidate groups after size grouping
    pub size_groups: usize,
    /// Candidate groups after quick hashing
    pub quickhash_groups: usize,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Duplicate files, not counting one original per group
    pub duplicate_files: usize,
    /// Files left out because they vanished or timed out
    pub unavailable_files: usize,
    /// Files left out because reading them failed
    pub failed_files: usize,
    /// Bytes reclaimable by removing duplicates
    pub reclaimable_space: u64,
    /// Wall time of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Process exit code
    pub exit_code: i32,
    /// Machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn new(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            size_groups: summary.size_groups,
            quickhash_groups: summary.quickhash_groups,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            unavailable_files: summary.unavailable_files,
            failed_files: summary.failed_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// List of duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
}

impl JsonOutput {
    /// Create a new JSON output from duplicate groups, summary and exit code.
    ///
    /// ```
    /// use dupesieve::duplicates::ScanSummary;
    /// use dupesieve::error::ExitCode;
    /// use dupesieve::output::json::JsonOutput;
    ///
    /// let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::NoDuplicates);
    /// assert!(output.duplicates.is_empty());
    /// assert_eq!(output.summary.exit_code, 2);
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary: JsonSummary::new(summary, exit_code),
            generated_at: Utc::now(),
        }
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), JsonOutputError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
