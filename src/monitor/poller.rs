use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clipboard::SystemClipboard;

/// Which representations a capture cycle tries, and in what order. The first one
/// present on the clipboard is the one captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureOrder {
    /// string, image, file list, rich text
    #[default]
    TextFirst,
    /// file list, string, image, rich text
    FilesFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Text,
    Image,
    Files,
    RichText,
}

impl CaptureOrder {
    pub fn sequence(&self) -> [Representation; 4] {
        match self {
            CaptureOrder::TextFirst => [
                Representation::Text,
                Representation::Image,
                Representation::Files,
                Representation::RichText,
            ],
            CaptureOrder::FilesFirst => [
                Representation::Files,
                Representation::Text,
                Representation::Image,
                Representation::RichText,
            ],
        }
    }
}

// ============================================================================
// CHANGE POLLER
// ============================================================================

/// Samples the clipboard change counter on each tick and admits at most one capture
/// cycle at a time.
pub struct ChangePoller {
    clipboard: Arc<dyn SystemClipboard>,
    busy: Arc<AtomicBool>,
    last_change: Option<u64>,
    /// Counter value our own write will show once a lagging counter catches up.
    own_write: Option<u64>,
    interval: Duration,
}

/// Held by a running capture cycle; the poller is free again once it is dropped.
#[derive(Debug)]
pub struct CycleGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl ChangePoller {
    pub fn new(clipboard: Arc<dyn SystemClipboard>, interval: Duration) -> Self {
        Self {
            clipboard,
            busy: Arc::new(AtomicBool::new(false)),
            last_change: None,
            own_write: None,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_idle(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }

    /// Returns a guard when a new cycle should run. `None` while a cycle is in flight
    /// or when the change counter has not moved.
    pub fn tick(&mut self) -> Option<CycleGuard> {
        if !self.is_idle() {
            debug!("Capture cycle still running, skipping tick");
            return None;
        }

        if let Some(count) = self.clipboard.change_count() {
            if self.last_change == Some(count) {
                return None;
            }
            self.last_change = Some(count);
            if self.own_write.take() == Some(count) {
                debug!(count, "Counter caught up with own write, skipping");
                return None;
            }
        }

        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Current counter value, taken before the engine writes to the clipboard.
    pub fn sample(&self) -> Option<u64> {
        self.clipboard.change_count()
    }

    /// Marks the engine's own clipboard write so it is not taken for an external
    /// change. `before` is the counter sampled ahead of the write. Some counters move
    /// only after the write returns (the Wayland watcher hears about it later); then
    /// the next increment is the one to skip.
    pub fn note_own_write(&mut self, before: Option<u64>) {
        let Some(after) = self.clipboard.change_count() else {
            return;
        };
        if Some(after) == before {
            self.own_write = Some(after.wrapping_add(1));
        } else {
            self.last_change = Some(after);
            self.own_write = None;
        }
    }
}
