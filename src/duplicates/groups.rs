//! Grouping engine, candidate groups and size-based file organization.
//!
//! # Overview
//!
//! Every stage of the pipeline ends the same way: bucket the surviving files
//! by a key and throw away buckets with a single member, since a unique size,
//! fingerprint or digest cannot be a duplicate. [`group_by_key`] implements
//! that once for any key type.
//!
//! Bucket order is the order in which each key was first seen, and members
//! keep their input order, so grouping never reorders the enumeration.
//!
//! # Example
//!
//! ```
//! use dupesieve::scanner::FileRecord;
//! use dupesieve::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(*groups[0].key(), 1024);
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::{Digest, FileRecord};

/// Bucket `items` by `key`, keeping only buckets with two or more members.
///
/// Keys are compared with exact equality. Buckets appear in the order their
/// key was first encountered and members appear in input order. Pure; no
/// I/O.
///
/// # Example
///
/// ```
/// use dupesieve::duplicates::group_by_key;
///
/// let words = ["apple", "bob", "avocado", "cat", "banana"];
/// let groups = group_by_key(words, |w| w.as_bytes()[0]);
///
/// assert_eq!(groups, vec![
///     (b'a', vec!["apple", "avocado"]),
///     (b'b', vec!["bob", "banana"]),
/// ]);
/// ```
pub fn group_by_key<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<(K, Vec<T>)> = Vec::new();

    for item in items {
        let k = key(&item);
        match slots.get(&k) {
            Some(&idx) => buckets[idx].1.push(item),
            None => {
                slots.insert(k.clone(), buckets.len());
                buckets.push((k, vec![item]));
            }
        }
    }

    buckets.retain(|(_, members)| members.len() > 1);
    buckets
}

/// Two or more files sharing the key of one pipeline stage.
///
/// Cannot be constructed with fewer than two members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateGroup<K> {
    key: K,
    files: Vec<FileRecord>,
}

impl<K> CandidateGroup<K> {
    /// Create a group, or `None` if fewer than two files remain.
    #[must_use]
    pub fn new(key: K, files: Vec<FileRecord>) -> Option<Self> {
        (files.len() > 1).then_some(Self { key, files })
    }

    /// The key shared by every member.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Members in enumeration order.
    #[must_use]
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// Consume the group, returning its members.
    #[must_use]
    pub fn into_files(self) -> Vec<FileRecord> {
        self.files
    }

    /// Consume the group, returning its key and members.
    #[must_use]
    pub fn into_parts(self) -> (K, Vec<FileRecord>) {
        (self.key, self.files)
    }

    /// Number of files in this group (always at least two).
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Size of the members, taken from the first file.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.files.first().map_or(0, FileRecord::size)
    }
}

/// Regroup every group's members by `key`, never merging across groups.
///
/// Members for which `key` yields `None` are dropped first; sub-groups that
/// end up with fewer than two members are dropped too.
pub fn subdivide<K, J, F>(groups: Vec<CandidateGroup<K>>, mut key: F) -> Vec<CandidateGroup<J>>
where
    J: Eq + Hash + Clone,
    F: FnMut(&FileRecord) -> Option<J>,
{
    groups
        .into_iter()
        .flat_map(|group| {
            let keyed: Vec<(J, FileRecord)> = group
                .into_files()
                .into_iter()
                .filter_map(|file| key(&file).map(|k| (k, file)))
                .collect();
            group_by_key(keyed, |(k, _)| k.clone())
                .into_iter()
                .filter_map(|(k, members)| {
                    CandidateGroup::new(k, members.into_iter().map(|(_, f)| f).collect())
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Confirmed duplicate group of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// SHA-512 digest of the shared content
    pub digest: Digest,
    /// File size in bytes (shared by all files)
    pub size: u64,
    /// Files with identical content, in enumeration order
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Build from a digest-keyed candidate group.
    #[must_use]
    pub fn from_candidates(group: CandidateGroup<Digest>) -> Self {
        let size = group.size();
        let CandidateGroup { key, files } = group;
        Self {
            digest: key,
            size,
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Space taken by every copy beyond the first.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of copies beyond the first.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Member paths in order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path().to_path_buf()).collect()
    }
}

/// Statistics from size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct non-zero sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique
    pub eliminated_unique: usize,
    /// Number of empty files encountered (never grouped)
    pub empty_files: usize,
    /// Number of size groups with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size (Phase 1 of duplicate detection).
///
/// Files with different sizes cannot be duplicates, so this eliminates most
/// files without any I/O. Empty files are never grouped.
///
/// # Returns
///
/// A tuple of:
/// - `Vec<CandidateGroup<u64>>` - Size groups with 2+ files, in first-seen order
/// - `GroupingStats` - Statistics about the grouping operation
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileRecord>,
) -> (Vec<CandidateGroup<u64>>, GroupingStats) {
    let mut stats = GroupingStats::default();
    let mut non_empty = Vec::new();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size();

        if file.size() == 0 {
            stats.empty_files += 1;
            log::debug!("Empty file encountered: {}", file.path().display());
            continue;
        }

        non_empty.push(file);
    }

    if stats.empty_files > 0 {
        log::warn!("Skipped {} empty file(s)", stats.empty_files);
    }

    let mut distinct: HashMap<u64, usize> = HashMap::new();
    for file in &non_empty {
        *distinct.entry(file.size()).or_default() += 1;
    }
    stats.unique_sizes = distinct.len();
    stats.eliminated_unique = distinct.values().filter(|&&n| n == 1).count();

    let groups: Vec<CandidateGroup<u64>> = group_by_key(non_empty, FileRecord::size)
        .into_iter()
        .filter_map(|(size, files)| CandidateGroup::new(size, files))
        .inspect(|group| {
            log::debug!(
                "Size group {} bytes: {} potential duplicates",
                group.key(),
                group.len()
            );
        })
        .collect();

    stats.duplicate_groups = groups.len();
    stats.potential_duplicates = groups.iter().map(CandidateGroup::len).sum();

    log::info!(
        "Phase 1 complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (groups, stats)
}
