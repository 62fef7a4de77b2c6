//! The clipboard history engine
//!
//! [`ClipboardEngine`] lives on one owning thread. That thread drives the poll timer,
//! applies every history mutation and publishes snapshots to subscribers. Capture
//! cycles (clipboard reads, classification, blob writes) run on a background worker
//! and hand their result back through the owner queue.

pub mod dispatch;
pub mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::clipboard::{ClipboardWrite, SystemClipboard};
use crate::config::EngineConfig;
use crate::content::FingerprintTracker;
use crate::error::{EngineError, Result};
use crate::history::{ClipboardHistory, HistoryFilter, HistorySnapshot, InsertOutcome, search};
use crate::models::{ClipboardEntry, EntryId, Payload};
use crate::monitor::{CaptureContext, ChangePoller, run_capture_cycle};
use crate::storage::{BlobStore, KeyValueStore, PersistenceGateway};
use crate::utils::HISTORY_KEY;

pub use dispatch::{OwnerHandle, OwnerQueue, OwnerTask};
pub use worker::BackgroundWorker;

/// Longest the owner loop waits before re-checking the shutdown flag.
const SHUTDOWN_CHECK: Duration = Duration::from_millis(100);
const SETTLE_POLL: Duration = Duration::from_millis(5);
const SHUTDOWN_SETTLE: Duration = Duration::from_secs(2);

pub struct ClipboardEngine {
    config: EngineConfig,
    history: ClipboardHistory,
    blobs: Arc<BlobStore>,
    clipboard: Arc<dyn SystemClipboard>,
    tracker: Arc<Mutex<FingerprintTracker>>,
    poller: ChangePoller,
    worker: BackgroundWorker,
    persistence: PersistenceGateway,
    owner: OwnerQueue<ClipboardEngine>,
}

impl ClipboardEngine {
    /// Opens the blob directory, restores saved history and seeds the fingerprints
    /// from it. Only failing to create the blob directory is an error.
    pub fn open(
        config: EngineConfig,
        clipboard: Arc<dyn SystemClipboard>,
        slot: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let blobs = Arc::new(BlobStore::open(config.blobs_dir())?);
        let persistence = PersistenceGateway::start(slot, HISTORY_KEY, config.save_debounce());

        let loaded = persistence.load(&blobs);
        let tracker = FingerprintTracker::rehydrate(&loaded);

        let mut history =
            ClipboardHistory::new(Arc::clone(&blobs), config.max_history, config.ordering);
        if history.restore(loaded) > 0 {
            // evicted blobs are already gone, the saved record must not list them
            persistence.schedule_save(history.entries().to_vec());
        }

        match blobs.retain(&history.referenced_blobs()) {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Removed orphaned blobs"),
            Err(e) => warn!(error = %e, "Failed to scan blob directory"),
        }

        let poller = ChangePoller::new(Arc::clone(&clipboard), config.poll_interval());
        info!(
            entries = history.len(),
            data_dir = %config.data_dir().display(),
            "Clipboard history engine ready"
        );

        Ok(Self {
            config,
            history,
            blobs,
            clipboard,
            tracker: Arc::new(Mutex::new(tracker)),
            poller,
            worker: BackgroundWorker::spawn("clipboard-capture"),
            persistence,
            owner: OwnerQueue::new(),
        })
    }

    // ========================================================================
    // RUNTIME
    // ========================================================================

    /// Runs the poll timer and the owner queue until `shutdown` is raised, then
    /// flushes pending work.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        let interval = self.poller.interval();
        let mut next_tick = Instant::now();

        while !shutdown.load(Ordering::SeqCst) {
            if Instant::now() >= next_tick {
                self.tick();
                next_tick = Instant::now() + interval;
            }

            let wait = next_tick
                .saturating_duration_since(Instant::now())
                .min(SHUTDOWN_CHECK);
            if let Some(task) = self.owner.next_timeout(wait) {
                task(self);
                self.run_pending();
            }
        }

        self.shutdown();
    }

    /// One poll step: starts a capture cycle on the worker if the clipboard changed
    /// and no cycle is running.
    pub fn tick(&mut self) {
        let Some(guard) = self.poller.tick() else {
            return;
        };

        let ctx = CaptureContext {
            clipboard: Arc::clone(&self.clipboard),
            tracker: Arc::clone(&self.tracker),
            blobs: Arc::clone(&self.blobs),
            order: self.config.capture_order,
        };
        let owner = self.owner.handle();

        let submitted = self.worker.submit(move || {
            if let Some(entry) = run_capture_cycle(&ctx) {
                owner.post(move |engine: &mut ClipboardEngine| engine.apply_capture(entry));
            }
            drop(guard);
        });
        if !submitted {
            warn!("Capture worker unavailable, skipping clipboard change");
        }
    }

    /// Runs every queued owner task. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.owner.try_next() {
            task(self);
            ran += 1;
        }
        ran
    }

    /// Waits until no capture cycle is in flight and the owner queue is drained.
    /// Returns `false` if that did not happen within `timeout`.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_pending();
            if self.poller.is_idle() && self.owner.pending() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            if let Some(task) = self.owner.next_timeout(SETTLE_POLL) {
                task(self);
            }
        }
    }

    /// Polls once and waits for the resulting capture to land in history.
    pub fn poll_now(&mut self, timeout: Duration) -> bool {
        self.tick();
        self.settle(timeout)
    }

    /// Drains in-flight captures and writes any pending save.
    pub fn shutdown(&mut self) {
        if !self.settle(SHUTDOWN_SETTLE) {
            warn!("Capture still running at shutdown");
        }
        self.persistence.flush();
        debug!("Clipboard history engine stopped");
    }

    /// A handle other threads use to run code against the engine on its thread.
    pub fn owner_handle(&self) -> OwnerHandle<ClipboardEngine> {
        self.owner.handle()
    }

    fn apply_capture(&mut self, entry: ClipboardEntry) {
        self.insert(entry);
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    pub fn insert(&mut self, entry: ClipboardEntry) -> InsertOutcome {
        let outcome = self.history.insert(entry);
        self.persist();
        outcome
    }

    pub fn remove(&mut self, id: EntryId) -> bool {
        let removed = self.history.remove(id);
        if removed {
            self.persist();
        } else {
            debug!(entry_id = %id, "Remove of unknown entry ignored");
        }
        removed
    }

    /// Returns the new pin state, or `None` for an unknown id.
    pub fn toggle_pin(&mut self, id: EntryId) -> Option<bool> {
        let pinned = self.history.toggle_pin(id);
        match pinned {
            Some(_) => self.persist(),
            None => debug!(entry_id = %id, "Pin toggle of unknown entry ignored"),
        }
        pinned
    }

    /// Drops every entry and blob and forgets the last seen clipboard content, so the
    /// current clipboard is captured again on the next change.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.history.clear_all();
        self.tracker.lock().reset();
        self.persist();
        removed
    }

    pub fn clear_unpinned(&mut self) -> usize {
        let removed = self.history.clear_unpinned();
        self.persist();
        removed
    }

    /// Puts the entry back on the system clipboard. History is not modified and the
    /// write is not captured as a new entry.
    pub fn copy(&mut self, id: EntryId) -> Result<()> {
        let entry = self
            .history
            .get(id)
            .cloned()
            .ok_or(EngineError::UnknownEntry(id))?;

        // payload bytes are loaded with the history, so no blob read happens here
        let write = ClipboardWrite::for_entry(&entry, entry.payload.clone())?;
        let before = self.poller.sample();
        if let Err(e) = self.clipboard.write(&write) {
            warn!(entry_id = %id, error = %e, "Failed to copy entry to clipboard");
            return Err(e);
        }

        self.poller.note_own_write(before);
        self.tracker.lock().adopt(&entry);
        debug!(entry_id = %id, kind = %entry.kind, "Copied entry to clipboard");
        Ok(())
    }

    // ========================================================================
    // PUBLISHED STATE
    // ========================================================================

    pub fn subscribe(&mut self) -> Receiver<HistorySnapshot> {
        self.history.subscribe()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        self.history.snapshot()
    }

    pub fn entries(&self) -> &[ClipboardEntry] {
        self.history.entries()
    }

    pub fn get(&self, id: EntryId) -> Option<&ClipboardEntry> {
        self.history.get(id)
    }

    pub fn search(&self, query: &str, filter: HistoryFilter) -> Vec<&ClipboardEntry> {
        search(self.history.entries(), query, filter)
    }

    /// The entry's bytes, from memory or re-read from its blob.
    pub fn payload(&self, id: EntryId) -> Option<Payload> {
        let entry = self.history.get(id)?;
        entry.payload.clone().or_else(|| {
            entry
                .blob_ref
                .as_ref()
                .and_then(|blob| self.blobs.get(blob))
                .map(Payload::from)
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    fn persist(&self) {
        self.persistence.schedule_save(self.history.entries().to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::models::EntryKind;
    use crate::storage::MemorySlotStore;

    const WAIT: Duration = Duration::from_secs(5);

    fn engine(clipboard: &Arc<MemoryClipboard>) -> (tempfile::TempDir, ClipboardEngine) {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            save_debounce_ms: 10,
            ..EngineConfig::with_data_dir(dir.path())
        };
        let engine =
            ClipboardEngine::open(config, clipboard.clone(), Arc::new(MemorySlotStore::new()))
                .unwrap();
        (dir, engine)
    }

    #[test]
    fn capture_lands_in_history_on_the_owner() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let (_dir, mut engine) = engine(&clipboard);

        clipboard.set_text("hello");
        assert!(engine.poll_now(WAIT));
        assert_eq!(engine.entries().len(), 1);
        assert_eq!(engine.entries()[0].content, "hello");

        assert!(engine.poll_now(WAIT));
        assert_eq!(engine.entries().len(), 1);
    }

    #[test]
    fn copy_does_not_recapture_or_mutate() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let (_dir, mut engine) = engine(&clipboard);

        clipboard.set_text("first");
        engine.poll_now(WAIT);
        clipboard.set_text("second");
        engine.poll_now(WAIT);
        let first = engine.entries()[1].id;
        let before: Vec<EntryId> = engine.entries().iter().map(|e| e.id).collect();

        engine.copy(first).unwrap();
        engine.copy(first).unwrap();
        engine.poll_now(WAIT);

        let after: Vec<EntryId> = engine.entries().iter().map(|e| e.id).collect();
        assert_eq!(before, after);
        assert_eq!(
            clipboard.writes(),
            vec![
                ClipboardWrite::Text("first".into()),
                ClipboardWrite::Text("first".into())
            ]
        );
    }

    #[test]
    fn copy_of_unknown_entry_fails() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let (_dir, mut engine) = engine(&clipboard);
        assert!(matches!(
            engine.copy(EntryId::new()),
            Err(EngineError::UnknownEntry(_))
        ));
    }

    #[test]
    fn copy_reports_clipboard_failures() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let (_dir, mut engine) = engine(&clipboard);
        clipboard.set_text("x");
        engine.poll_now(WAIT);
        let id = engine.entries()[0].id;

        clipboard.set_fail_writes(true);
        assert!(matches!(engine.copy(id), Err(EngineError::Clipboard(_))));
    }

    #[test]
    fn clear_all_forgets_fingerprints() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let (_dir, mut engine) = engine(&clipboard);
        clipboard.set_text("again");
        engine.poll_now(WAIT);

        assert_eq!(engine.clear_all(), 1);
        assert!(engine.entries().is_empty());

        clipboard.set_text("again");
        engine.poll_now(WAIT);
        assert_eq!(engine.entries().len(), 1);
    }

    #[test]
    fn clear_unpinned_keeps_fingerprints() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let (_dir, mut engine) = engine(&clipboard);
        clipboard.set_text("seen");
        engine.poll_now(WAIT);

        engine.clear_unpinned();
        clipboard.set_text("seen");
        engine.poll_now(WAIT);
        assert!(engine.entries().is_empty());
    }

    #[test]
    fn image_payload_is_read_back_from_its_blob() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let (_dir, mut engine) = engine(&clipboard);
        let png = b"\x89PNG\r\n\x1a\npixels".to_vec();
        clipboard.set_image(png.clone());
        engine.poll_now(WAIT);

        let entry = &engine.entries()[0];
        assert_eq!(entry.kind, EntryKind::Image);
        let id = entry.id;
        assert_eq!(engine.payload(id).as_deref(), Some(png.as_slice()));
    }

    #[test]
    fn owner_handle_runs_tasks_on_the_engine() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let (_dir, mut engine) = engine(&clipboard);
        let handle = engine.owner_handle();

        std::thread::spawn(move || {
            handle.post(|engine: &mut ClipboardEngine| {
                engine.insert(ClipboardEntry::new_text("from another thread"));
            });
        })
        .join()
        .unwrap();

        assert!(engine.settle(WAIT));
        assert_eq!(engine.entries()[0].content, "from another thread");
    }
}
