//! Debounced save and startup restore of history metadata
//!
//! The ordered entry list is written as one JSON record into a key-value slot.
//! Saves are coalesced on a dedicated thread: each request replaces the pending
//! snapshot and pushes the write back by the quiet period.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::content::content_digest;
use crate::error::Result;
use crate::models::{ClipboardEntry, EntryKind};
use crate::storage::{BlobStore, KeyValueStore};
use crate::utils::HISTORY_FORMAT_VERSION;

// ============================================================================
// RECORD FORMAT
// ============================================================================

#[derive(Serialize)]
struct HistoryRecord<'a> {
    version: u32,
    entries: &'a [ClipboardEntry],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Versioned {
        #[allow(dead_code)]
        version: u32,
        entries: Vec<ClipboardEntry>,
    },
    /// Records written before the format carried a version.
    Bare(Vec<ClipboardEntry>),
}

pub fn encode_history(entries: &[ClipboardEntry]) -> Result<String> {
    Ok(serde_json::to_string(&HistoryRecord {
        version: HISTORY_FORMAT_VERSION,
        entries,
    })?)
}

pub fn decode_history(raw: &str) -> Result<Vec<ClipboardEntry>> {
    let entries = match serde_json::from_str::<StoredHistory>(raw)? {
        StoredHistory::Versioned { entries, .. } => entries,
        StoredHistory::Bare(entries) => entries,
    };
    Ok(entries)
}

/// Reads the persisted history. Blob bytes of payload-carrying entries are read here,
/// so later copies never touch the disk on the owning thread. Any failure yields an
/// empty history; an undecodable record is removed so it is not read again.
pub fn load_history(slot: &dyn KeyValueStore, key: &str, blobs: &BlobStore) -> Vec<ClipboardEntry> {
    let raw = match slot.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "Failed to read saved history, starting empty");
            return Vec::new();
        }
    };

    let decoded = match decode_history(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Discarding unreadable saved history");
            if let Err(e) = slot.remove(key) {
                warn!(error = %e, "Failed to remove unreadable saved history");
            }
            return Vec::new();
        }
    };

    let entries = hydrate(decoded, blobs);
    info!(count = entries.len(), "Loaded clipboard history");
    entries
}

/// Reads the persisted history without touching the slot. Read and decode failures
/// are returned to the caller.
pub fn read_history(slot: &dyn KeyValueStore, key: &str, blobs: &BlobStore) -> Result<Vec<ClipboardEntry>> {
    let Some(raw) = slot.read(key)? else {
        return Ok(Vec::new());
    };
    Ok(hydrate(decode_history(&raw)?, blobs))
}

/// Drops duplicate ids and fills in payload bytes and missing image digests.
fn hydrate(decoded: Vec<ClipboardEntry>, blobs: &BlobStore) -> Vec<ClipboardEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(decoded.len());
    for mut entry in decoded {
        if !seen.insert(entry.id) {
            warn!(entry_id = %entry.id, "Dropping duplicate entry id from saved history");
            continue;
        }

        entry.restore_inline_payload();
        if entry.kind.carries_payload() && entry.payload.is_none() {
            if let Some(blob) = &entry.blob_ref {
                entry.payload = blobs.get(blob).map(Into::into);
            }
        }
        if entry.kind == EntryKind::Image && entry.digest.is_none() {
            entry.digest = entry.payload.as_deref().map(content_digest);
        }
        entries.push(entry);
    }

    entries
}

// ============================================================================
// DEBOUNCED GATEWAY
// ============================================================================

enum SaveCommand {
    Save(Vec<ClipboardEntry>),
    Flush(SyncSender<()>),
    Shutdown,
}

pub struct PersistenceGateway {
    slot: Arc<dyn KeyValueStore>,
    key: String,
    tx: Sender<SaveCommand>,
    handle: Option<JoinHandle<()>>,
}

impl PersistenceGateway {
    pub fn start(slot: Arc<dyn KeyValueStore>, key: impl Into<String>, quiet: Duration) -> Self {
        let key = key.into();
        let (tx, rx) = mpsc::channel();

        let thread_slot = Arc::clone(&slot);
        let thread_key = key.clone();
        let handle = thread::Builder::new()
            .name("history-save".into())
            .spawn(move || debounce_loop(rx, thread_slot, thread_key, quiet))
            .map_err(|e| warn!(error = %e, "Failed to start save thread, saves are disabled"))
            .ok();

        Self {
            slot,
            key,
            tx,
            handle,
        }
    }

    pub fn load(&self, blobs: &BlobStore) -> Vec<ClipboardEntry> {
        load_history(self.slot.as_ref(), &self.key, blobs)
    }

    /// Replaces any pending save with `entries`, written after the quiet period.
    pub fn schedule_save(&self, entries: Vec<ClipboardEntry>) {
        if self.tx.send(SaveCommand::Save(entries)).is_err() {
            warn!("Save thread is gone, history change not persisted");
        }
    }

    /// Writes the pending snapshot now and waits for it.
    pub fn flush(&self) {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        if self.tx.send(SaveCommand::Flush(reply_tx)).is_ok() {
            let _ = reply_rx.recv();
        }
    }
}

impl Drop for PersistenceGateway {
    fn drop(&mut self) {
        let _ = self.tx.send(SaveCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn debounce_loop(rx: Receiver<SaveCommand>, slot: Arc<dyn KeyValueStore>, key: String, quiet: Duration) {
    let mut pending: Option<Vec<ClipboardEntry>> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        let command = match deadline {
            Some(at) => match rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(SaveCommand::Shutdown),
            },
            None => Some(rx.recv().unwrap_or(SaveCommand::Shutdown)),
        };

        match command {
            None => {
                write_pending(slot.as_ref(), &key, pending.take());
                deadline = None;
            }
            Some(SaveCommand::Save(entries)) => {
                pending = Some(entries);
                deadline = Some(Instant::now() + quiet);
            }
            Some(SaveCommand::Flush(reply)) => {
                write_pending(slot.as_ref(), &key, pending.take());
                deadline = None;
                let _ = reply.send(());
            }
            Some(SaveCommand::Shutdown) => {
                write_pending(slot.as_ref(), &key, pending.take());
                break;
            }
        }
    }
}

fn write_pending(slot: &dyn KeyValueStore, key: &str, pending: Option<Vec<ClipboardEntry>>) {
    let Some(entries) = pending else {
        return;
    };
    match encode_history(&entries).and_then(|json| slot.write(key, &json)) {
        Ok(()) => debug!(count = entries.len(), "Saved clipboard history"),
        Err(e) => warn!(error = %e, "Failed to save clipboard history"),
    }
}
