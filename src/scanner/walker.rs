//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory tree
//! and producing one [`FileRecord`] per regular file. It uses [`jwalk`] for
//! parallel directory reading while keeping a deterministic output order:
//! the children of every directory are sorted by name.
//!
//! # Rules
//!
//! - Symbolic links are never followed and never yielded
//! - Zero-length files are skipped
//! - Paths are absolute (the root is canonicalized once)
//! - Gitignore-style patterns prune files and whole directories
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{FileRecord, ScanError, WalkerConfig};

/// Directory walker for parallel file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        let root = std::fs::canonicalize(path)
            .or_else(|_| std::path::absolute(path))
            .unwrap_or_else(|_| path.to_path_buf());
        Self {
            root,
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker will stop iteration
    /// as soon as possible.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The absolute root this walker enumerates.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build gitignore matcher from config patterns and .gitignore file.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        let gitignore_path = self.root.join(".gitignore");
        if gitignore_path.exists() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check if a file passes size filters. Empty files never pass.
    fn passes_size_filter(&self, size: u64) -> bool {
        if size == 0 {
            return false;
        }
        if self.config.min_size.is_some_and(|min| size < min) {
            return false;
        }
        if self.config.max_size.is_some_and(|max| size > max) {
            return false;
        }
        true
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Records come out in a stable order: depth-first, with
    /// siblings sorted by file name.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let gitignore = self.build_gitignore();
        let dir_filter = gitignore.clone();
        let stop = self.shutdown_flag.clone();

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                if stop.as_ref().is_some_and(|f| f.load(Ordering::SeqCst)) {
                    children.clear();
                    return;
                }

                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });

                // Prune ignored directories instead of descending into them
                if let Some(ref gi) = dir_filter {
                    for child in children.iter_mut().flatten() {
                        if child.file_type().is_dir()
                            && gi.matched(child.path(), true).is_ignore()
                        {
                            child.read_children_path = None;
                        }
                    }
                }
            });

        walk_dir
            .into_iter()
            .take_while(move |_| {
                let stop = self.is_shutdown_requested();
                if stop {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                }
                !stop
            })
            .filter_map(move |entry_result| {
                let entry = match entry_result {
                    Ok(entry) => entry,
                    Err(e) => return Some(Err(scan_error(e))),
                };

                let file_type = entry.file_type();
                if !file_type.is_file() {
                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", entry.path().display());
                    }
                    return None;
                }

                let path = entry.path();
                if let Some(ref gi) = gitignore {
                    if gi.matched(&path, false).is_ignore() {
                        log::trace!("Ignoring file: {}", path.display());
                        return None;
                    }
                }

                let size = match entry.metadata() {
                    Ok(metadata) => metadata.len(),
                    Err(e) => return Some(Err(scan_error(e))),
                };

                if !self.passes_size_filter(size) {
                    log::trace!("Skipping by size ({} bytes): {}", size, path.display());
                    return None;
                }

                Some(Ok(FileRecord::new(path, size)))
            })
    }
}

/// Convert a jwalk error into a [`ScanError`] carrying the failing path.
fn scan_error(err: jwalk::Error) -> ScanError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    match err.io_error().map(io::Error::kind) {
        Some(io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
        Some(io::ErrorKind::NotFound) => ScanError::NotFound(path),
        _ => ScanError::Io {
            path,
            source: io::Error::from(err),
        },
    }
}
