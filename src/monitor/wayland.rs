use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, warn};

const CHANGE_MARKER: &str = "CHANGED";

/// Counts Wayland selection changes reported by a `wl-paste --watch` child process.
///
/// `wl-paste` runs `echo CHANGED` on every selection change, so the counter follows
/// the compositor's notifications instead of content comparison.
pub struct ChangeWatcher {
    count: Arc<AtomicU64>,
    child: Mutex<Child>,
}

impl ChangeWatcher {
    pub fn spawn() -> Option<Self> {
        let mut child = match Command::new("wl-paste")
            .args(["--watch", "echo", CHANGE_MARKER])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(error = %e, "Failed to start wl-paste watcher");
                return None;
            }
        };

        let Some(stdout) = child.stdout.take() else {
            warn!("wl-paste watcher has no stdout");
            let _ = child.kill();
            return None;
        };

        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);
        let spawned = thread::Builder::new()
            .name("wl-paste-watch".into())
            .spawn(move || {
                for line in BufReader::new(stdout).lines().map_while(|l| l.ok()) {
                    if line.trim() == CHANGE_MARKER {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                }
                debug!("wl-paste watcher stream closed");
            });
        if let Err(e) = spawned {
            warn!(error = %e, "Failed to start watcher thread");
            let _ = child.kill();
            return None;
        }

        Some(Self {
            count,
            child: Mutex::new(child),
        })
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        let mut child = self.child.lock();
        let _ = child.kill();
        let _ = child.wait();
    }
}
