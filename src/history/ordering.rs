use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{ClipboardEntry, EntryKind};

/// How unpinned entries are ranked. Pinned entries always lead, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Newest capture first.
    #[default]
    Recency,
    /// Bucketed by kind, then format, then newest first, then content.
    GroupedFormat,
}

impl OrderingPolicy {
    pub fn compare(&self, a: &ClipboardEntry, b: &ClipboardEntry) -> Ordering {
        match (a.pinned, b.pinned) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (true, true) => return newest_first(a, b),
            (false, false) => {}
        }

        match self {
            OrderingPolicy::Recency => newest_first(a, b),
            OrderingPolicy::GroupedFormat => kind_rank(a.kind)
                .cmp(&kind_rank(b.kind))
                .then_with(|| format_key(a).cmp(&format_key(b)))
                .then_with(|| newest_first(a, b))
                .then_with(|| a.content.to_lowercase().cmp(&b.content.to_lowercase())),
        }
    }

    /// Stable sort, so entries that compare equal keep their insertion order.
    pub fn sort(&self, entries: &mut [ClipboardEntry]) {
        entries.sort_by(|a, b| self.compare(a, b));
    }
}

fn newest_first(a: &ClipboardEntry, b: &ClipboardEntry) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

fn kind_rank(kind: EntryKind) -> u8 {
    match kind {
        EntryKind::Text => 0,
        EntryKind::Url => 1,
        EntryKind::File => 2,
        EntryKind::Video => 3,
        EntryKind::Image => 4,
        EntryKind::RichText => 5,
    }
}

/// Second-level grouping key inside a kind bucket.
fn format_key(entry: &ClipboardEntry) -> String {
    match entry.kind {
        EntryKind::Text | EntryKind::RichText => String::new(),
        EntryKind::Url => url::Url::parse(&entry.content)
            .map(|u| u.scheme().to_string())
            .unwrap_or_default(),
        EntryKind::File | EntryKind::Video | EntryKind::Image => entry
            .file_paths()
            .first()
            .and_then(|p| Path::new(p).extension())
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
    }
}

/// Cuts the unpinned tail beyond `max_unpinned` out of an already sorted list and
/// returns it. Pinned entries are never counted or removed.
pub fn split_excess(entries: &mut Vec<ClipboardEntry>, max_unpinned: usize) -> Vec<ClipboardEntry> {
    let mut kept_unpinned = 0;
    let mut evicted = Vec::new();
    let mut kept = Vec::with_capacity(entries.len());

    for entry in entries.drain(..) {
        if entry.pinned {
            kept.push(entry);
        } else if kept_unpinned < max_unpinned {
            kept_unpinned += 1;
            kept.push(entry);
        } else {
            evicted.push(entry);
        }
    }

    *entries = kept;
    evicted
}
