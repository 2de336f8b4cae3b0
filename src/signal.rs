//! Ctrl+C handling for graceful shutdown.
//!
//! A single `AtomicBool` is shared by the walker, the hasher and the finder.
//! Setting it makes every stage stop at its next check, and the run ends
//! with [`crate::duplicates::FinderError::Interrupted`] (exit code 130).
//!
//! ```rust,no_run
//! use dupesieve::duplicates::FinderConfig;
//! use dupesieve::signal::install_handler;
//!
//! let handler = install_handler();
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once Ctrl+C was pressed or [`Self::request_shutdown`] was called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown by hand.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag for the components that poll it.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// The hook can only be registered once per process. Later calls get the
/// same handler back with its flag cleared, so several in-process runs (as
/// in tests) each start un-interrupted. If registration fails, the returned
/// handler still works for manual shutdown requests.
pub fn install_handler() -> ShutdownHandler {
    let handler = GLOBAL_HANDLER.get_or_init(|| {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();

        let installed = ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\nInterrupted. Cleaning up...");
            let _ = stderr.flush();
            log::info!("Shutdown signal received");
        });
        if let Err(e) = installed {
            log::debug!("Ctrl+C handler not installed: {}", e);
        }

        handler
    });

    handler.reset();
    handler.clone()
}
