//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Generic key-based grouping shared by every stage
//! - Size-based file grouping (Phase 1)
//! - Sampled-window fingerprint comparison (Phase 2)
//! - Full digest comparison (Phase 3)

pub mod finder;
pub mod groups;

pub use finder::{
    phase2_quickhash, phase3_fullhash, DuplicateFinder, FinderConfig, FinderError, FullhashStats,
    QuickhashStats, ScanSummary,
};
pub use groups::{
    group_by_key, group_by_size, subdivide, CandidateGroup, DuplicateGroup, GroupingStats,
};
