//! Partial-window fingerprints and full-content digests.
//!
//! # Overview
//!
//! The [`Hasher`] computes the two content keys used by the duplicate
//! pipeline:
//!
//! - [`Hasher::quick_hash`]: XXH3-128 over a [`WINDOW_SIZE`] byte window
//!   centred in the file. Cheap enough to run on every same-size candidate.
//! - [`Hasher::full_hash`]: SHA-512 over the whole file, streamed through a
//!   fixed buffer. Treated as ground truth for byte identity.
//!
//! # Failure classes
//!
//! A quick hash distinguishes three outcomes. A file that was deleted or
//! moved after enumeration (`NotFound` on open, stat or read), or whose path
//! no longer names a regular file, is reported as [`QuickHash::Unavailable`]
//! and simply drops out of the run. Every other I/O error is returned as a
//! [`HashError`] and aborts the run.
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::scanner::{Hasher, QuickHash};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! match hasher.quick_hash(Path::new("photo.jpg")).unwrap() {
//!     QuickHash::Fingerprint(fp) => println!("fingerprint {fp}"),
//!     QuickHash::Unavailable(why) => println!("skipped: {why}"),
//! }
//! let digest = hasher.full_hash(Path::new("photo.jpg")).unwrap();
//! println!("sha512 {}", digest.short());
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sha2::{Digest as _, Sha512};
use xxhash_rust::xxh3::xxh3_128;

use super::{Digest, Fingerprint, HashError};

/// Number of bytes sampled from the middle of a file for its fingerprint.
pub const WINDOW_SIZE: usize = 1024;

/// Read buffer for full-content hashing.
const BUFFER_SIZE: usize = 128 * 1024;

/// Why a file produced no fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// The file was deleted or moved after enumeration.
    Vanished,
    /// The path now names something other than a regular file.
    NotARegularFile,
    /// Hashing did not finish within the configured timeout.
    TimedOut,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vanished => f.write_str("file vanished"),
            Self::NotARegularFile => f.write_str("no longer a regular file"),
            Self::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Outcome of a quick hash that did not hit a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickHash {
    /// The window was read and hashed.
    Fingerprint(Fingerprint),
    /// The file is gone or changed kind; exclude it from this run.
    Unavailable(Unavailable),
}

/// Byte offset of the sampled window for a file of `size` bytes.
///
/// The window is centred; files smaller than the window start at zero.
#[must_use]
pub fn window_offset(size: u64, window: u64) -> u64 {
    (size / 2).saturating_sub(window / 2)
}

/// Content hasher shared by the quick-hash and full-hash stages.
#[derive(Debug, Clone)]
pub struct Hasher {
    window: usize,
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default window and buffer sizes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            window: WINDOW_SIZE,
            buffer_size: BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Override the sampled window size (minimum 1 byte).
    #[must_use]
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    /// Override the full-hash read buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Stop full hashing early once the flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Sampled window size in bytes.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Fingerprint the window centred in the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] for any I/O failure other than the file having
    /// disappeared, which is reported as [`QuickHash::Unavailable`].
    pub fn quick_hash(&self, path: &Path) -> Result<QuickHash, HashError> {
        match self.read_window(path) {
            Ok(Some(bytes)) => Ok(QuickHash::Fingerprint(Fingerprint::from_u128(xxh3_128(
                &bytes,
            )))),
            Ok(None) => {
                log::debug!("Not a regular file anymore: {}", path.display());
                Ok(QuickHash::Unavailable(Unavailable::NotARegularFile))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("File vanished before quick hash: {}", path.display());
                Ok(QuickHash::Unavailable(Unavailable::Vanished))
            }
            Err(e) => Err(HashError::from_io(path, e)),
        }
    }

    /// Read the sampled window, or `None` if the path is not a regular file.
    fn read_window(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        let mut file = File::open(path)?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Ok(None);
        }

        let offset = window_offset(metadata.len(), self.window as u64);
        file.seek(SeekFrom::Start(offset))?;

        // A file truncated since the stat simply yields fewer bytes.
        let mut bytes = Vec::with_capacity(self.window);
        file.take(self.window as u64).read_to_end(&mut bytes)?;

        log::trace!(
            "Sampled {} bytes at offset {} of {}",
            bytes.len(),
            offset,
            path.display()
        );
        Ok(Some(bytes))
    }

    /// Compute the SHA-512 digest of the whole file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or if a
    /// shutdown was requested mid-file.
    pub fn full_hash(&self, path: &Path) -> Result<Digest, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = Sha512::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Io {
                    path: path.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::Interrupted, "shutdown requested"),
                });
            }

            let count = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };

            hasher.update(&buffer[..count]);
        }

        Ok(Digest::from_bytes(&hasher.finalize()))
    }
}
