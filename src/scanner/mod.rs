//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Sampled-window fingerprints (XXH3-128)
//! - Full-content digests (SHA-512)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Partial and full content hashing
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path().display(), file.size()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use hasher::{Hasher, QuickHash, Unavailable, WINDOW_SIZE};
pub use walker::Walker;

/// Render raw digest bytes as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Partial-content fingerprint: 128-bit XXH3 of the sampled window, as hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Length of the hex rendering in characters.
    pub const HEX_LEN: usize = 32;

    /// Build a fingerprint from the raw 128-bit hash value.
    #[must_use]
    pub fn from_u128(value: u128) -> Self {
        Self(format!("{value:032x}"))
    }

    /// The hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full-content digest: SHA-512 of the entire file, as hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Length of the hex rendering in characters.
    pub const HEX_LEN: usize = 128;

    /// Number of characters shown in human-readable reports.
    pub const DISPLAY_LEN: usize = 6;

    /// Build a digest from raw SHA-512 output bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hash_to_hex(bytes))
    }

    /// The hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for display.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..Self::DISPLAY_LEN.min(self.0.len())]
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One enumerated regular file and the keys attached to it by the pipeline.
///
/// Records are never mutated in place. Each hashing stage consumes the
/// record and returns a new one carrying its key, so a fingerprint or
/// digest is attached exactly once, by the single task that computed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    path: PathBuf,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    partial_fingerprint: Option<Fingerprint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_digest: Option<Digest>,
}

impl FileRecord {
    /// Create a record for a freshly enumerated file.
    ///
    /// # Arguments
    ///
    /// * `path` - Absolute path to the file
    /// * `size` - File size in bytes at enumeration time
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            partial_fingerprint: None,
            full_digest: None,
        }
    }

    /// Path to the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes recorded at enumeration.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Fingerprint attached by the quick-hash stage, if it ran.
    #[must_use]
    pub fn partial_fingerprint(&self) -> Option<&Fingerprint> {
        self.partial_fingerprint.as_ref()
    }

    /// Digest attached by the full-hash stage, if it ran.
    #[must_use]
    pub fn full_digest(&self) -> Option<&Digest> {
        self.full_digest.as_ref()
    }

    /// Return this record with its partial fingerprint attached.
    #[must_use]
    pub fn with_fingerprint(self, fingerprint: Fingerprint) -> Self {
        debug_assert!(
            self.partial_fingerprint.is_none(),
            "fingerprint already set for {}",
            self.path.display()
        );
        Self {
            partial_fingerprint: Some(fingerprint),
            ..self
        }
    }

    /// Return this record with its full digest attached.
    #[must_use]
    pub fn with_digest(self, digest: Digest) -> Self {
        debug_assert!(
            self.full_digest.is_none(),
            "digest already set for {}",
            self.path.display()
        );
        Self {
            full_digest: Some(digest),
            ..self
        }
    }
}

/// Configuration for directory walking.
///
/// Controls filtering and other walk behavior. Symbolic links are never
/// followed and zero-length files are never yielded.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// Glob patterns to ignore (gitignore-style).
    /// These are applied in addition to a root `.gitignore` file.
    pub ignore_patterns: Vec<String>,
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while hashing `path`.
    #[must_use]
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
