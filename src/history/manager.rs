use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, info};

use crate::history::ordering::{OrderingPolicy, split_excess};
use crate::models::{BlobId, ClipboardEntry, EntryId};
use crate::storage::BlobStore;

// ============================================================================
// PUBLISHED STATE
// ============================================================================

/// Ordered history as seen by subscribers after a mutation.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    pub revision: u64,
    pub entries: Arc<[ClipboardEntry]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new entry was added; `collapsed` older duplicates and `evicted` overflow
    /// entries were removed along with it.
    Inserted {
        id: EntryId,
        collapsed: usize,
        evicted: usize,
    },
    /// A pinned entry with the same identity took over the new payload instead.
    UpdatedPinned(EntryId),
}

// ============================================================================
// CLIPBOARD HISTORY
// ============================================================================

/// The ordered entry list. Owned by one thread; mutations go through `&mut self`
/// and every one of them is published to subscribers.
///
/// Blob files referenced by entries are deleted in the same call that drops the
/// entry, so no operation leaves a dangling `blob_ref` or an orphaned file behind.
pub struct ClipboardHistory {
    entries: Vec<ClipboardEntry>,
    blobs: Arc<BlobStore>,
    max_unpinned: usize,
    ordering: OrderingPolicy,
    revision: u64,
    subscribers: Vec<Sender<HistorySnapshot>>,
}

impl ClipboardHistory {
    pub fn new(blobs: Arc<BlobStore>, max_unpinned: usize, ordering: OrderingPolicy) -> Self {
        Self {
            entries: Vec::with_capacity(max_unpinned),
            blobs,
            max_unpinned,
            ordering,
            revision: 0,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the contents with entries restored from disk, re-applying ordering
    /// and the capacity bound. Returns how many entries were evicted.
    pub fn restore(&mut self, entries: Vec<ClipboardEntry>) -> usize {
        self.entries = entries;
        let evicted = self.normalize();
        if evicted > 0 {
            info!(evicted, "Trimmed restored history to capacity");
        }
        self.publish();
        evicted
    }

    pub fn entries(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&ClipboardEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pinned_count(&self) -> usize {
        self.entries.iter().filter(|e| e.pinned).count()
    }

    pub fn unpinned_count(&self) -> usize {
        self.entries.len() - self.pinned_count()
    }

    pub fn max_unpinned(&self) -> usize {
        self.max_unpinned
    }

    pub fn ordering(&self) -> OrderingPolicy {
        self.ordering
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn insert(&mut self, mut entry: ClipboardEntry) -> InsertOutcome {
        if self.get(entry.id).is_some() {
            entry.id = EntryId::new();
        }

        let identity = entry.identity().to_string();

        if let Some(pinned) = self
            .entries
            .iter_mut()
            .find(|e| e.pinned && e.identity() == identity)
        {
            let id = pinned.id;
            if let Some(stale) = pinned.adopt_payload(entry) {
                self.blobs.delete(&stale);
            }
            debug!(entry_id = %id, "Duplicate of pinned entry, payload updated in place");
            self.publish();
            return InsertOutcome::UpdatedPinned(id);
        }

        let (duplicates, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| !e.pinned && e.identity() == identity);
        self.entries = kept;
        let collapsed = duplicates.len();
        self.discard(duplicates);

        let id = entry.id;
        debug!(entry_id = %id, kind = %entry.kind, collapsed, "Inserted clipboard entry");
        self.entries.insert(0, entry);

        let evicted = self.normalize();
        self.publish();
        InsertOutcome::Inserted {
            id,
            collapsed,
            evicted,
        }
    }

    pub fn remove(&mut self, id: EntryId) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.id == id) else {
            return false;
        };
        let removed = self.entries.remove(index);
        self.discard(vec![removed]);
        self.publish();
        true
    }

    /// Flips the pin flag and returns the new state.
    pub fn toggle_pin(&mut self, id: EntryId) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        entry.pinned = !entry.pinned;
        let pinned = entry.pinned;

        self.normalize();
        self.publish();
        Some(pinned)
    }

    /// Deletes every entry and blob. Returns how many entries were removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = std::mem::take(&mut self.entries);
        let count = removed.len();
        self.discard(removed);
        info!(count, "Cleared all history");
        self.publish();
        count
    }

    pub fn clear_unpinned(&mut self) -> usize {
        let (pinned, unpinned): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.pinned);
        self.entries = pinned;
        let count = unpinned.len();
        self.discard(unpinned);
        info!(count, "Cleared unpinned history");
        self.publish();
        count
    }

    /// Blob ids still referenced by live entries.
    pub fn referenced_blobs(&self) -> HashSet<BlobId> {
        self.entries
            .iter()
            .filter_map(|e| e.blob_ref.clone())
            .collect()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            revision: self.revision,
            entries: self.entries.clone().into(),
        }
    }

    /// The receiver gets the current snapshot right away and one per mutation after.
    pub fn subscribe(&mut self) -> Receiver<HistorySnapshot> {
        let (tx, rx) = mpsc::channel();
        if tx.send(self.snapshot()).is_ok() {
            self.subscribers.push(tx);
        }
        rx
    }

    /// Sorts and evicts overflow; returns the number evicted.
    fn normalize(&mut self) -> usize {
        self.ordering.sort(&mut self.entries);
        let evicted = split_excess(&mut self.entries, self.max_unpinned);
        let count = evicted.len();
        if count > 0 {
            debug!(count, max = self.max_unpinned, "Evicted oldest unpinned entries");
        }
        self.discard(evicted);
        count
    }

    fn discard(&self, removed: Vec<ClipboardEntry>) {
        for blob in removed.iter().filter_map(|e| e.blob_ref.as_ref()) {
            self.blobs.delete(blob);
        }
    }

    fn publish(&mut self) {
        self.revision += 1;
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
    }
}
