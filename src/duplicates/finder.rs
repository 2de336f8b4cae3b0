//! Duplicate finder implementation with multi-phase detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Phase 1 - Size grouping**: Group files by size (see [`crate::duplicates::groups`] module)
//! 2. **Phase 2 - Quick hash**: Fingerprint a 1 KiB window centred in each same-size file
//! 3. **Phase 3 - Full hash**: SHA-512 of the entire content of fingerprint matches
//!
//! Each phase only splits or shrinks the groups handed to it; files from
//! different groups are never compared again.
//!
//! # Concurrency
//!
//! Hashing runs on a dedicated rayon pool with `io_threads` workers. A worker
//! opens one file at a time, so `io_threads` caps the number of open handles.
//! Results are collected through indexed parallel iterators, so the output
//! order matches enumeration order no matter how work is scheduled.
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::scanner::{Walker, WalkerConfig, Hasher};
//! use dupesieve::duplicates::{group_by_size, phase2_quickhash, FinderConfig};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! let (size_groups, _) = group_by_size(files);
//!
//! let hasher = Arc::new(Hasher::new());
//! let config = FinderConfig::default();
//! let (groups, stats) = phase2_quickhash(size_groups, &hasher, &config).unwrap();
//!
//! println!("Phase 2: {} candidate groups, {} files", groups.len(), stats.potential_duplicates);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::groups::{group_by_size, subdivide, CandidateGroup, DuplicateGroup};
use crate::progress::{Phase, ProgressCallback};
use crate::scanner::{
    FileRecord, Fingerprint, HashError, Hasher, QuickHash, ScanError, Unavailable, Walker,
    WalkerConfig,
};

/// Threshold for logging large files.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100MB

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing; also the open-file cap.
    pub io_threads: usize,
    /// Abort on the first enumeration or full-hash error.
    pub strict: bool,
    /// Give up on a single file after this long and exclude it.
    pub hash_timeout: Option<Duration>,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("strict", &self.strict)
            .field("hash_timeout", &self.hash_timeout)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            strict: false,
            hash_timeout: None,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Create a new configuration with custom I/O thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set fail-fast on enumeration and full-hash errors.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the per-file hash timeout.
    #[must_use]
    pub fn with_hash_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.hash_timeout = timeout;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn phase_start(&self, phase: Phase, total: usize) {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(phase, total);
        }
    }

    fn phase_end(&self, phase: Phase, count: usize) {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(phase, count);
        }
    }
}

/// Statistics from the quick-hash phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickhashStats {
    /// Total files that entered Phase 2
    pub input_files: usize,
    /// Number of files fingerprinted
    pub hashed_files: usize,
    /// Files that vanished or changed kind before they could be read
    pub unavailable_files: usize,
    /// Files excluded because hashing exceeded the timeout
    pub timed_out_files: usize,
    /// Fingerprinted files whose fingerprint was unique within their size group
    pub unique_fingerprints: usize,
    /// Number of files that could still be duplicates
    pub potential_duplicates: usize,
    /// Number of fingerprint groups with 2+ files
    pub duplicate_groups: usize,
}

impl QuickhashStats {
    /// Percentage of input files eliminated by this phase.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.input_files == 0 {
            0.0
        } else {
            let eliminated = self.input_files - self.potential_duplicates;
            (eliminated as f64 / self.input_files as f64) * 100.0
        }
    }
}

/// Statistics from the full-hash phase.
#[derive(Debug, Default)]
pub struct FullhashStats {
    /// Total files that entered Phase 3
    pub input_files: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Number of files that failed to hash (I/O errors)
    pub failed_files: usize,
    /// Files excluded because hashing exceeded the timeout
    pub timed_out_files: usize,
    /// Errors encountered during full hash
    pub errors: Vec<HashError>,
    /// Total bytes hashed across all files
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Number of files in confirmed groups
    pub confirmed_files: usize,
    /// Number of confirmed duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Total space wasted by duplicates
    pub wasted_space: u64,
}

impl FullhashStats {
    /// Calculate wasted space from duplicate groups.
    pub fn calculate_wasted_space(&mut self, groups: &[DuplicateGroup]) {
        self.duplicate_groups = groups.len();
        self.confirmed_files = groups.iter().map(DuplicateGroup::len).sum();
        self.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        self.wasted_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Total number of files enumerated
    pub total_files: usize,
    /// Total size of all enumerated files in bytes
    pub total_size: u64,
    /// Candidate groups after size grouping
    pub size_groups: usize,
    /// Files in those groups
    pub size_candidates: usize,
    /// Candidate groups after quick hashing
    pub quickhash_groups: usize,
    /// Files in those groups
    pub quickhash_candidates: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Files in confirmed groups
    pub confirmed_files: usize,
    /// Number of files eliminated by size grouping (unique sizes)
    pub eliminated_by_size: usize,
    /// Number of files eliminated by a unique fingerprint
    pub eliminated_by_quickhash: usize,
    /// Files excluded because they vanished, changed kind or timed out
    pub unavailable_files: usize,
    /// Files excluded because the full hash failed
    pub failed_files: usize,
    /// Files excluded because hashing exceeded the timeout, in either hashing phase
    pub timed_out_files: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Enumeration errors that did not stop the scan
    pub scan_errors: Vec<ScanError>,
    /// Full-hash errors that did not stop the scan
    pub hash_errors: Vec<HashError>,
}

impl ScanSummary {
    /// Whether any file was skipped because of an error or a timeout.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.scan_errors.is_empty() || !self.hash_errors.is_empty() || self.timed_out_files > 0
    }

    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }

    /// The progressive per-phase count lines, in pipeline order.
    #[must_use]
    pub fn stage_lines(&self) -> Vec<String> {
        vec![
            Phase::Walking.summary(self.total_files),
            Phase::Size.summary(self.size_groups),
            Phase::QuickHash.summary(self.quickhash_groups),
            Phase::FullHash.summary(self.duplicate_groups),
        ]
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A hashing failure that aborts the run.
    #[error("{phase} failed: {source}")]
    Hash {
        /// Phase in which the failure happened
        phase: Phase,
        /// The underlying hash error, carrying the path
        #[source]
        source: HashError,
    },

    /// The hashing thread pool could not be created.
    #[error("Failed to build hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A scan error occurred in strict mode.
    #[error(transparent)]
    ScanError(#[from] ScanError),
}

impl FinderError {
    /// Path of the file that caused the failure, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PathNotFound(p) | Self::NotADirectory(p) => Some(p),
            Self::Hash { source, .. } => Some(source.path()),
            _ => None,
        }
    }
}

/// What happened to one file in a hashing phase.
enum HashOutcome {
    /// Hashed; the record carries the new key.
    Keyed(FileRecord),
    /// Dropped from the run without an error.
    Skipped(FileRecord, Unavailable),
    /// Dropped from the run because hashing failed.
    Failed(FileRecord, HashError),
}

/// Per-phase outcome counters.
#[derive(Default)]
struct Tally {
    hashed: usize,
    skipped: usize,
    timed_out: usize,
    bytes: u64,
    errors: Vec<HashError>,
}

enum Timed<T> {
    Done(T),
    TimedOut,
}

/// Run `job`, abandoning it if it has not finished within `timeout`.
///
/// An abandoned job keeps running on its own thread until its read returns;
/// its result is discarded.
fn run_with_timeout<T, F>(timeout: Option<Duration>, job: F) -> Timed<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let Some(limit) = timeout else {
        return Timed::Done(job());
    };

    let (tx, rx) = crossbeam_channel::bounded(1);
    let spawned = std::thread::Builder::new()
        .name("dupesieve-hash".to_string())
        .spawn(move || {
            let _ = tx.send(job());
        });

    if let Err(e) = spawned {
        log::warn!("Failed to spawn hash thread, giving up on timeout: {}", e);
        return Timed::TimedOut;
    }

    match rx.recv_timeout(limit) {
        Ok(value) => Timed::Done(value),
        Err(_) => Timed::TimedOut,
    }
}

fn build_pool(io_threads: usize) -> Result<rayon::ThreadPool, FinderError> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(io_threads.max(1))
        .thread_name(|i| format!("dupesieve-io-{i}"))
        .build()?)
}

/// Hash every member of every group in parallel, keeping group and member order.
fn hash_groups<K, F>(
    pool: &rayon::ThreadPool,
    groups: Vec<CandidateGroup<K>>,
    phase: Phase,
    config: &FinderConfig,
    hash_one: F,
) -> Result<Vec<(K, Vec<HashOutcome>)>, FinderError>
where
    K: Send,
    F: Fn(FileRecord) -> Result<HashOutcome, FinderError> + Sync,
{
    let total: usize = groups.iter().map(CandidateGroup::len).sum();
    config.phase_start(phase, total);
    let processed = AtomicUsize::new(0);

    pool.install(|| {
        groups
            .into_par_iter()
            .map(|group| {
                let (key, files) = group.into_parts();
                files
                    .into_par_iter()
                    .map(|file| {
                        if config.is_shutdown_requested() {
                            return Err(FinderError::Interrupted);
                        }
                        if let Some(ref callback) = config.progress_callback {
                            let n = processed.fetch_add(1, Ordering::Relaxed) + 1;
                            callback.on_progress(n, file.path().to_string_lossy().as_ref());
                        }
                        hash_one(file)
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(|outcomes| (key, outcomes))
            })
            .collect()
    })
}

/// Fold hashed outcomes back into groups, dropping groups left with one member.
fn settle<K>(
    results: Vec<(K, Vec<HashOutcome>)>,
    phase: Phase,
    tally: &mut Tally,
) -> Vec<CandidateGroup<K>> {
    let mut groups = Vec::with_capacity(results.len());

    for (key, outcomes) in results {
        let mut kept = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                HashOutcome::Keyed(file) => {
                    tally.hashed += 1;
                    tally.bytes += file.size();
                    kept.push(file);
                }
                HashOutcome::Skipped(file, reason) => {
                    tally.skipped += 1;
                    if reason == Unavailable::TimedOut {
                        tally.timed_out += 1;
                    }
                    log::warn!("{}: skipping {} ({})", phase, file.path().display(), reason);
                }
                HashOutcome::Failed(file, error) => {
                    log::warn!("{}: failed to hash {}: {}", phase, file.path().display(), error);
                    tally.errors.push(error);
                }
            }
        }

        match CandidateGroup::new(key, kept) {
            Some(group) => groups.push(group),
            None => log::trace!("{}: group dropped after losing members", phase),
        }
    }

    groups
}

/// Group files by fingerprint within size groups (Phase 2).
///
/// For each size group, fingerprints every member and splits the group by
/// fingerprint. Files that vanished since enumeration are excluded without
/// error.
///
/// # Errors
///
/// Returns [`FinderError::Hash`] on any I/O failure that is not a vanished
/// file, and [`FinderError::Interrupted`] if shutdown was requested.
pub fn phase2_quickhash(
    size_groups: Vec<CandidateGroup<u64>>,
    hasher: &Arc<Hasher>,
    config: &FinderConfig,
) -> Result<(Vec<CandidateGroup<Fingerprint>>, QuickhashStats), FinderError> {
    let pool = build_pool(config.io_threads)?;
    quickhash_on(&pool, size_groups, hasher, config)
}

fn quickhash_on(
    pool: &rayon::ThreadPool,
    size_groups: Vec<CandidateGroup<u64>>,
    hasher: &Arc<Hasher>,
    config: &FinderConfig,
) -> Result<(Vec<CandidateGroup<Fingerprint>>, QuickhashStats), FinderError> {
    let mut stats = QuickhashStats {
        input_files: size_groups.iter().map(CandidateGroup::len).sum(),
        ..Default::default()
    };

    if size_groups.is_empty() {
        log::debug!("Phase 2: No files to process");
        config.phase_end(Phase::QuickHash, 0);
        return Ok((Vec::new(), stats));
    }

    log::info!("Phase 2: Computing fingerprints for {} files", stats.input_files);

    let results = hash_groups(pool, size_groups, Phase::QuickHash, config, |file| {
        let path = file.path().to_path_buf();
        let job_hasher = Arc::clone(hasher);
        match run_with_timeout(config.hash_timeout, move || job_hasher.quick_hash(&path)) {
            Timed::Done(Ok(QuickHash::Fingerprint(fp))) => {
                log::trace!("Fingerprint {} for {}", fp, file.path().display());
                Ok(HashOutcome::Keyed(file.with_fingerprint(fp)))
            }
            Timed::Done(Ok(QuickHash::Unavailable(reason))) => {
                Ok(HashOutcome::Skipped(file, reason))
            }
            Timed::Done(Err(source)) => Err(FinderError::Hash {
                phase: Phase::QuickHash,
                source,
            }),
            Timed::TimedOut => Ok(HashOutcome::Skipped(file, Unavailable::TimedOut)),
        }
    })?;

    let mut tally = Tally::default();
    let survivors = settle(results, Phase::QuickHash, &mut tally);
    let surviving_files: usize = survivors.iter().map(CandidateGroup::len).sum();

    let groups = subdivide(survivors, |f| f.partial_fingerprint().cloned());
    for group in &groups {
        log::debug!(
            "Fingerprint group {}: {} potential duplicates",
            group.key(),
            group.len()
        );
    }

    stats.hashed_files = tally.hashed;
    stats.unavailable_files = tally.skipped;
    stats.timed_out_files = tally.timed_out;
    stats.duplicate_groups = groups.len();
    stats.potential_duplicates = groups.iter().map(CandidateGroup::len).sum();
    stats.unique_fingerprints = surviving_files - stats.potential_duplicates;

    config.phase_end(Phase::QuickHash, groups.len());
    log::info!(
        "Phase 2 complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.input_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    Ok((groups, stats))
}

/// Confirm duplicates by full-content digest (Phase 3).
///
/// Files that fail to hash are logged and excluded; in strict mode the first
/// failure aborts the run instead.
///
/// # Errors
///
/// Returns [`FinderError::Hash`] in strict mode, and
/// [`FinderError::Interrupted`] if shutdown was requested.
pub fn phase3_fullhash(
    fingerprint_groups: Vec<CandidateGroup<Fingerprint>>,
    hasher: &Arc<Hasher>,
    config: &FinderConfig,
) -> Result<(Vec<DuplicateGroup>, FullhashStats), FinderError> {
    let pool = build_pool(config.io_threads)?;
    fullhash_on(&pool, fingerprint_groups, hasher, config)
}

fn fullhash_on(
    pool: &rayon::ThreadPool,
    fingerprint_groups: Vec<CandidateGroup<Fingerprint>>,
    hasher: &Arc<Hasher>,
    config: &FinderConfig,
) -> Result<(Vec<DuplicateGroup>, FullhashStats), FinderError> {
    let mut stats = FullhashStats {
        input_files: fingerprint_groups.iter().map(CandidateGroup::len).sum(),
        ..Default::default()
    };

    if fingerprint_groups.is_empty() {
        log::debug!("Phase 3: No files to process");
        config.phase_end(Phase::FullHash, 0);
        return Ok((Vec::new(), stats));
    }

    log::info!("Phase 3: Computing full hashes for {} files", stats.input_files);

    let results = hash_groups(pool, fingerprint_groups, Phase::FullHash, config, |file| {
        if file.size() > LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({}): {}",
                ByteSize::b(file.size()),
                file.path().display()
            );
        }

        let path = file.path().to_path_buf();
        let job_hasher = Arc::clone(hasher);
        match run_with_timeout(config.hash_timeout, move || job_hasher.full_hash(&path)) {
            Timed::Done(Ok(digest)) => Ok(HashOutcome::Keyed(file.with_digest(digest))),
            Timed::Done(Err(_)) if config.is_shutdown_requested() => {
                Err(FinderError::Interrupted)
            }
            Timed::Done(Err(source)) if config.strict => Err(FinderError::Hash {
                phase: Phase::FullHash,
                source,
            }),
            Timed::Done(Err(source)) => Ok(HashOutcome::Failed(file, source)),
            Timed::TimedOut => Ok(HashOutcome::Skipped(file, Unavailable::TimedOut)),
        }
    })?;

    let mut tally = Tally::default();
    let survivors = settle(results, Phase::FullHash, &mut tally);

    let groups: Vec<DuplicateGroup> = subdivide(survivors, |f| f.full_digest().cloned())
        .into_iter()
        .map(DuplicateGroup::from_candidates)
        .collect();
    for group in &groups {
        log::debug!(
            "Duplicate group {}: {} files, {} bytes each",
            group.digest.short(),
            group.len(),
            group.size
        );
    }

    stats.hashed_files = tally.hashed;
    stats.bytes_hashed = tally.bytes;
    stats.timed_out_files = tally.timed_out;
    stats.failed_files = tally.errors.len();
    stats.errors = tally.errors;
    stats.calculate_wasted_space(&groups);

    config.phase_end(Phase::FullHash, groups.len());
    log::info!(
        "Phase 3 complete: {} groups, {} duplicates, {} bytes reclaimable",
        stats.duplicate_groups,
        stats.duplicate_files,
        stats.wasted_space
    );

    Ok((groups, stats))
}

/// Duplicate finder that orchestrates the multi-phase detection pipeline.
///
/// The `DuplicateFinder` runs the complete duplicate detection pipeline:
/// 1. **Walk** - Collect all non-empty regular files under the root
/// 2. **Phase 1** - Group files by size
/// 3. **Phase 2** - Compare sampled-window fingerprints of same-size files
/// 4. **Phase 3** - Compute full digests to confirm duplicates
///
/// # Example
///
/// ```no_run
/// use dupesieve::duplicates::{DuplicateFinder, FinderConfig};
/// use std::path::Path;
///
/// let config = FinderConfig::default().with_io_threads(4);
/// let finder = DuplicateFinder::new(config);
///
/// let (groups, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
///
/// println!("Found {} duplicate groups", summary.duplicate_groups);
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
    /// Hashing pool shared by both hashing phases and by every run.
    pool: OnceLock<rayon::ThreadPool>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Self {
            config,
            hasher: Arc::new(hasher),
            pool: OnceLock::new(),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The hashing pool, built on first use.
    fn pool(&self) -> Result<&rayon::ThreadPool, FinderError> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        let built = build_pool(self.config.io_threads)?;
        Ok(self.pool.get_or_init(|| built))
    }

    /// Find all duplicate files under the given directory.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist or is not a directory
    /// - A fingerprint could not be computed for a reason other than the file vanishing
    /// - Strict mode is on and enumeration or full hashing failed
    /// - The scan is interrupted by shutdown signal
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();

        if !path.exists() {
            return Err(FinderError::PathNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }

        log::info!("Starting duplicate scan of {}", path.display());

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        self.config.phase_start(Phase::Walking, 0);

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut files = Vec::new();
        let mut scan_errors = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(files.len() + 1, file.path().to_string_lossy().as_ref());
                    }
                    files.push(file);
                }
                Err(e) if self.config.strict => return Err(FinderError::ScanError(e)),
                Err(e) => {
                    log::warn!("{}", e);
                    scan_errors.push(e);
                }
            }
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        self.config.phase_end(Phase::Walking, files.len());

        let (groups, mut summary) = self.run_pipeline(files, start_time)?;
        summary.scan_errors = scan_errors;
        Ok((groups, summary))
    }

    /// Find duplicates from a pre-collected list of files.
    ///
    /// Use this method when the files come from another source than the
    /// built-in walker. Records are processed in the order given.
    ///
    /// # Errors
    ///
    /// Same as [`DuplicateFinder::find_duplicates`], minus path validation.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileRecord>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        self.run_pipeline(files, start_time)
    }

    fn run_pipeline(
        &self,
        files: Vec<FileRecord>,
        start_time: Instant,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let mut summary = ScanSummary {
            total_files: files.len(),
            total_size: files.iter().map(FileRecord::size).sum(),
            ..Default::default()
        };

        log::info!(
            "Found {} files ({} total)",
            summary.total_files,
            summary.total_size_display()
        );

        // Phase 1: Group by size
        self.config.phase_start(Phase::Size, files.len());
        let (size_groups, size_stats) = group_by_size(files);
        summary.size_groups = size_groups.len();
        summary.size_candidates = size_stats.potential_duplicates;
        summary.eliminated_by_size = size_stats.eliminated_unique;
        self.config.phase_end(Phase::Size, size_groups.len());

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let pool = self.pool()?;

        // Phase 2: Quick hash
        let (fingerprint_groups, quick_stats) =
            quickhash_on(pool, size_groups, &self.hasher, &self.config)?;
        summary.quickhash_groups = fingerprint_groups.len();
        summary.quickhash_candidates = quick_stats.potential_duplicates;
        summary.eliminated_by_quickhash = quick_stats.unique_fingerprints;
        summary.unavailable_files = quick_stats.unavailable_files;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Phase 3: Full hash
        let (duplicate_groups, full_stats) =
            fullhash_on(pool, fingerprint_groups, &self.hasher, &self.config)?;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        summary.unavailable_files += full_stats.timed_out_files;
        summary.timed_out_files = quick_stats.timed_out_files + full_stats.timed_out_files;
        summary.failed_files = full_stats.failed_files;
        summary.hash_errors = full_stats.errors;
        summary.duplicate_groups = full_stats.duplicate_groups;
        summary.confirmed_files = full_stats.confirmed_files;
        summary.duplicate_files = full_stats.duplicate_files;
        summary.reclaimable_space = full_stats.wasted_space;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
        );

        Ok((duplicate_groups, summary))
    }
}
