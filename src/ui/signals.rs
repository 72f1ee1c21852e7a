use crate::error::{JeffError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stop request polled by the file processor between files.
///
/// Clones share one flag, so the Ctrl+C handler and the run see the same
/// request.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    requested: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes Ctrl+C to this signal. A second Ctrl+C exits with status 130
    /// without waiting for the current file.
    pub fn install_ctrlc_handler(&self) -> Result<()> {
        let requested = self.requested.clone();

        ctrlc::set_handler(move || {
            if requested.swap(true, Ordering::SeqCst) {
                eprintln!("\nForce stopping...");
                std::process::exit(130);
            }
            eprintln!("\nStopping after the current file... (press Ctrl+C again to force exit)");
        })
        .map_err(|e| JeffError::Config {
            message: format!("Failed to set signal handler: {}", e),
        })
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// `Cancelled` once a stop has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_requested() {
            return Err(JeffError::Cancelled);
        }
        Ok(())
    }
}
