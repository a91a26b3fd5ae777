//! Ctrl+C handling for cooperative cancellation.
//!
//! The handler only flips a shared `AtomicBool`. The walker, the hashing
//! phases and the finder poll that flag between files and between phases;
//! an interrupted scan ends with [`crate::duplicates::FinderError::Interrupted`]
//! and nothing is deleted. A deletion batch that has already started is
//! allowed to finish.
//!
//! ```rust,no_run
//! use prunedupe::signal::install_handler;
//! use prunedupe::duplicates::FinderConfig;
//!
//! let shutdown = install_handler();
//! let config = FinderConfig::default().with_shutdown_flag(shutdown.flag());
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

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown as if Ctrl+C had been pressed.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// The flag to hand to the finder, walker and hasher.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler and return its flag.
///
/// `ctrlc` accepts one handler per process, so later calls (tests running
/// `run_app` repeatedly) get the installed handler back with its flag
/// cleared. If registration fails the returned handler still works for
/// [`ShutdownHandler::request_shutdown`].
pub fn install_handler() -> ShutdownHandler {
    let handler = GLOBAL_HANDLER.get_or_init(|| {
        let handler = ShutdownHandler::new();
        let flag = handler.flag();
        let installed = ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing current step...");
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
