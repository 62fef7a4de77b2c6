use sha2::{Digest, Sha256};
use tracing::debug;

use crate::models::{ClipboardEntry, EntryKind};

/// Hex-encoded SHA-256 of a binary payload.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintCategory {
    TextLike,
    Image,
}

impl FingerprintCategory {
    pub fn of(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Image => FingerprintCategory::Image,
            _ => FingerprintCategory::TextLike,
        }
    }
}

/// Remembers the last content seen per category so an unchanged clipboard is not
/// processed twice. Text-like content is compared verbatim, images by digest.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FingerprintTracker {
    last_text: Option<String>,
    last_image: Option<String>,
}

impl FingerprintTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the tracker from the newest entry of each category so a fresh start
    /// does not capture what is already on the clipboard.
    pub fn rehydrate(entries: &[ClipboardEntry]) -> Self {
        let newest = |category: FingerprintCategory| {
            entries
                .iter()
                .filter(|e| FingerprintCategory::of(e.kind) == category)
                .max_by_key(|e| e.created_at)
        };

        let last_text = newest(FingerprintCategory::TextLike).map(|e| e.content.clone());
        let last_image = newest(FingerprintCategory::Image).and_then(|e| {
            e.digest
                .clone()
                .or_else(|| e.payload.as_deref().map(content_digest))
        });

        debug!(
            has_text = last_text.is_some(),
            has_image = last_image.is_some(),
            "Rehydrated clipboard fingerprints"
        );
        Self {
            last_text,
            last_image,
        }
    }

    /// Records `fingerprint` for `category`; returns `false` when it matches the
    /// previous observation and the content should be ignored.
    pub fn observe(&mut self, category: FingerprintCategory, fingerprint: &str) -> bool {
        let slot = self.slot_mut(category);
        if slot.as_deref() == Some(fingerprint) {
            return false;
        }
        *slot = Some(fingerprint.to_string());
        true
    }

    pub fn last(&self, category: FingerprintCategory) -> Option<&str> {
        match category {
            FingerprintCategory::TextLike => self.last_text.as_deref(),
            FingerprintCategory::Image => self.last_image.as_deref(),
        }
    }

    /// Marks an entry the engine itself wrote to the clipboard as already seen.
    pub fn adopt(&mut self, entry: &ClipboardEntry) {
        let category = FingerprintCategory::of(entry.kind);
        let fingerprint = match category {
            FingerprintCategory::TextLike => Some(entry.content.clone()),
            FingerprintCategory::Image => entry.digest.clone(),
        };
        if let Some(fingerprint) = fingerprint {
            *self.slot_mut(category) = Some(fingerprint);
        }
    }

    pub fn reset(&mut self) {
        self.last_text = None;
        self.last_image = None;
    }

    fn slot_mut(&mut self, category: FingerprintCategory) -> &mut Option<String> {
        match category {
            FingerprintCategory::TextLike => &mut self.last_text,
            FingerprintCategory::Image => &mut self.last_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn digest_is_deterministic_sha256() {
        let a = content_digest(b"test png data");
        assert_eq!(a, content_digest(b"test png data"));
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_digest(b"other data"));
    }

    #[test]
    fn repeated_content_is_suppressed() {
        let mut tracker = FingerprintTracker::new();
        assert!(tracker.observe(FingerprintCategory::TextLike, "hello"));
        assert!(!tracker.observe(FingerprintCategory::TextLike, "hello"));
        assert!(tracker.observe(FingerprintCategory::TextLike, "world"));
    }

    #[test]
    fn categories_are_tracked_independently() {
        let mut tracker = FingerprintTracker::new();
        assert!(tracker.observe(FingerprintCategory::TextLike, "same"));
        assert!(tracker.observe(FingerprintCategory::Image, "digest-1"));
        // Copying the text again after an image is still a repeat of the text slot.
        assert!(!tracker.observe(FingerprintCategory::TextLike, "same"));
        assert!(tracker.observe(FingerprintCategory::Image, "digest-2"));
    }

    #[test]
    fn reset_forgets_everything() {
        let mut tracker = FingerprintTracker::new();
        tracker.observe(FingerprintCategory::TextLike, "x");
        tracker.reset();
        assert!(tracker.observe(FingerprintCategory::TextLike, "x"));
    }

    #[test]
    fn rehydrate_uses_newest_entry_per_category() {
        let mut old_text = ClipboardEntry::new_text("old");
        old_text.created_at = Utc::now() - Duration::minutes(5);
        let new_url = ClipboardEntry::new(EntryKind::Url, "https://new.example");
        let image = ClipboardEntry::new(EntryKind::Image, "Image.png")
            .with_payload(vec![1u8, 2, 3]);

        let tracker = FingerprintTracker::rehydrate(&[old_text, new_url, image]);
        assert_eq!(tracker.last(FingerprintCategory::TextLike), Some("https://new.example"));
        assert_eq!(
            tracker.last(FingerprintCategory::Image),
            Some(content_digest(&[1, 2, 3]).as_str())
        );
    }
}
