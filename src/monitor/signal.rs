use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{info, warn};

// ============================================================================
// SIGNAL LISTENER
// ============================================================================

/// Raises `shutdown_trigger` on the first SIGTERM or SIGINT.
pub fn start_signal_listener(shutdown_trigger: Arc<AtomicBool>) {
    let mut signals = match Signals::new([SIGTERM, SIGINT]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!(error = %e, "Failed to register signal handlers");
            return;
        }
    };

    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            info!(signal, "Shutdown requested");
            shutdown_trigger.store(true, Ordering::SeqCst);
        }
    });
}
