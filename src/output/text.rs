//! Human-readable report.
//!
//! ```text
//! 4 files found
//! 1 possible duplicate groups after size grouping
//! 1 possible duplicate groups after quick hashing
//! 1 duplicate groups found
//!
//! SHA512 hash: 3c9909
//!   /data/a
//!   /data/b
//!
//! 1 duplicate files in 1 groups, 100 B reclaimable
//! ```

use std::fmt::Display;
use std::io::{self, Write};

use yansi::{Paint, Style};

use crate::duplicates::{DuplicateGroup, ScanSummary};

const HEADING: Style = Style::new().cyan().bold();
const DIM: Style = Style::new().dim();
const EMPHASIS: Style = Style::new().green().bold();
const WARNING: Style = Style::new().yellow();

/// Plain-text report writer.
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    summary: &'a ScanSummary,
    color: bool,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a ScanSummary) -> Self {
        Self {
            groups,
            summary,
            color: false,
        }
    }

    /// Enable ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint<T: Display>(&self, value: T, style: Style) -> String {
        if self.color {
            value.paint(style).to_string()
        } else {
            value.to_string()
        }
    }

    /// Write the full report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        for line in self.summary.stage_lines() {
            writeln!(w, "{}", self.paint(line, DIM))?;
        }

        for group in self.groups {
            writeln!(w)?;
            writeln!(
                w,
                "{} {}",
                self.paint("SHA512 hash:", HEADING),
                group.digest.short()
            )?;
            for file in &group.files {
                writeln!(w, "  {}", file.path().display())?;
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "{} duplicate files in {} groups, {} reclaimable",
            self.summary.duplicate_files,
            self.summary.duplicate_groups,
            self.paint(self.summary.reclaimable_display(), EMPHASIS)
        )?;

        let skipped = self.summary.unavailable_files + self.summary.failed_files;
        if skipped > 0 {
            writeln!(
                w,
                "{}",
                self.paint(format!("{skipped} files skipped (see log for details)"), WARNING)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::CandidateGroup;
    use crate::scanner::{Digest, FileRecord};
    use std::path::PathBuf;

    fn render(groups: &[DuplicateGroup], summary: &ScanSummary, color: bool) -> String {
        let mut buf = Vec::new();
        TextOutput::new(groups, summary)
            .with_color(color)
            .write_to(&mut buf)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_empty_report() {
        let text = render(&[], &ScanSummary::default(), false);
        assert!(text.starts_with("0 files found\n"));
        assert!(text.contains("0 duplicate groups found\n"));
        assert!(text.contains("0 duplicate files in 0 groups, 0 B reclaimable"));
        assert!(!text.contains("SHA512"));
    }

    #[test]
    fn test_text_group_block() {
        let digest = Digest::from_bytes(&[0x3c, 0x99, 0x09, 0xaf, 0xec, 0x25]);
        let files = ["/data/a", "/data/b"]
            .into_iter()
            .map(|p| FileRecord::new(PathBuf::from(p), 100).with_digest(digest.clone()))
            .collect();
        let group = DuplicateGroup::from_candidates(CandidateGroup::new(digest, files).unwrap());
        let summary = ScanSummary {
            duplicate_groups: 1,
            duplicate_files: 1,
            reclaimable_space: 100,
            failed_files: 2,
            ..Default::default()
        };

        let text = render(&[group], &summary, false);
        assert!(text.contains("\nSHA512 hash: 3c9909\n  /data/a\n  /data/b\n"));
        assert!(text.contains("1 duplicate files in 1 groups, 100 B reclaimable"));
        assert!(text.contains("2 files skipped"));
    }

    #[test]
    fn test_text_color_toggle() {
        let plain = render(&[], &ScanSummary::default(), false);
        let colored = render(&[], &ScanSummary::default(), true);
        assert!(!plain.contains('\u{1b}'));
        assert!(colored.contains('\u{1b}'));
    }
}
