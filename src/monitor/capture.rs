use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::clipboard::SystemClipboard;
use crate::content::{FingerprintCategory, FingerprintTracker, RawPayload, classify};
use crate::models::ClipboardEntry;
use crate::monitor::poller::{CaptureOrder, Representation};
use crate::storage::BlobStore;

/// Everything a capture cycle needs, cloned onto the background worker.
#[derive(Clone)]
pub struct CaptureContext {
    pub clipboard: Arc<dyn SystemClipboard>,
    pub tracker: Arc<Mutex<FingerprintTracker>>,
    pub blobs: Arc<BlobStore>,
    pub order: CaptureOrder,
}

/// Reads the first available representation in capture order.
pub fn read_clipboard(clipboard: &dyn SystemClipboard, order: CaptureOrder) -> Option<RawPayload> {
    order.sequence().into_iter().find_map(|repr| match repr {
        Representation::Text => clipboard.read_text().map(RawPayload::Text),
        Representation::Image => clipboard.read_image().map(RawPayload::Image),
        Representation::Files => clipboard.read_files().map(RawPayload::Files),
        Representation::RichText => clipboard.read_rich_text().map(RawPayload::RichText),
    })
}

/// One detection cycle: read, classify, fingerprint and store the payload bytes.
/// Returns the entry to insert, or `None` when nothing new was found.
pub fn run_capture_cycle(ctx: &CaptureContext) -> Option<ClipboardEntry> {
    let raw = read_clipboard(ctx.clipboard.as_ref(), ctx.order)?;
    let classified = classify(raw)?;

    let category = FingerprintCategory::of(classified.kind);
    let fingerprint = match category {
        FingerprintCategory::Image => classified.digest.clone()?,
        FingerprintCategory::TextLike => classified.content.clone(),
    };
    if !ctx.tracker.lock().observe(category, &fingerprint) {
        debug!(kind = %classified.kind, "Clipboard content unchanged, skipping");
        return None;
    }

    let mut entry = classified.into_entry();
    if entry.kind.carries_payload() {
        // a failed put leaves the bytes in memory only
        entry.blob_ref = entry.payload.as_deref().and_then(|bytes| ctx.blobs.put(bytes));
    }

    debug!(entry_id = %entry.id, kind = %entry.kind, "Captured clipboard content");
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::models::EntryKind;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nrest";

    fn context(clipboard: Arc<MemoryClipboard>, order: CaptureOrder) -> (tempfile::TempDir, CaptureContext) {
        let dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(BlobStore::open(dir.path().join("blobs")).unwrap());
        let ctx = CaptureContext {
            clipboard,
            tracker: Arc::new(Mutex::new(FingerprintTracker::new())),
            blobs,
            order,
        };
        (dir, ctx)
    }

    #[test]
    fn text_is_captured_once() {
        let clipboard = Arc::new(MemoryClipboard::new());
        clipboard.set_text("  hello  ");
        let (_dir, ctx) = context(clipboard.clone(), CaptureOrder::TextFirst);

        let entry = run_capture_cycle(&ctx).unwrap();
        assert_eq!(entry.kind, EntryKind::Text);
        assert_eq!(entry.content, "hello");
        assert!(run_capture_cycle(&ctx).is_none());
    }

    #[test]
    fn images_go_to_the_blob_store() {
        let clipboard = Arc::new(MemoryClipboard::new());
        clipboard.set_image(PNG.to_vec());
        let (_dir, ctx) = context(clipboard, CaptureOrder::TextFirst);

        let entry = run_capture_cycle(&ctx).unwrap();
        assert_eq!(entry.kind, EntryKind::Image);
        assert_eq!(entry.content, "Image.png");
        let blob = entry.blob_ref.clone().unwrap();
        assert_eq!(ctx.blobs.get(&blob).unwrap(), PNG);
        assert_eq!(entry.payload.as_deref(), Some(PNG));
    }

    #[test]
    fn text_and_image_fingerprints_are_independent() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let (_dir, ctx) = context(clipboard.clone(), CaptureOrder::TextFirst);

        clipboard.set_text("same");
        assert!(run_capture_cycle(&ctx).is_some());
        clipboard.set_image(PNG.to_vec());
        assert!(run_capture_cycle(&ctx).is_some());
        clipboard.set_text("same");
        assert!(run_capture_cycle(&ctx).is_none());
        clipboard.set_image(PNG.to_vec());
        assert!(run_capture_cycle(&ctx).is_none());
    }

    #[test]
    fn plain_string_beside_rich_text_wins_in_text_first_order() {
        let clipboard = Arc::new(MemoryClipboard::new());
        clipboard.set_rich_text(br"{\rtf1 styled}".to_vec(), Some("plain".into()));
        let (_dir, ctx) = context(clipboard, CaptureOrder::TextFirst);

        let entry = run_capture_cycle(&ctx).unwrap();
        assert_eq!(entry.kind, EntryKind::Text);
        assert_eq!(entry.content, "plain");
        assert!(entry.blob_ref.is_none());
    }

    #[test]
    fn files_first_prefers_the_file_list() {
        let clipboard = Arc::new(MemoryClipboard::new());
        clipboard.set_files(["/home/me/movie.mkv"]);
        let (_dir, ctx) = context(clipboard, CaptureOrder::FilesFirst);

        let entry = run_capture_cycle(&ctx).unwrap();
        assert_eq!(entry.kind, EntryKind::Video);
        assert_eq!(entry.content, "/home/me/movie.mkv");
    }

    #[test]
    fn rich_text_keeps_styled_bytes() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let styled = br"{\rtf1\ansi {\b Bold} move}".to_vec();
        clipboard.set_rich_text(styled.clone(), None);
        let (_dir, ctx) = context(clipboard, CaptureOrder::TextFirst);

        let entry = run_capture_cycle(&ctx).unwrap();
        assert_eq!(entry.kind, EntryKind::RichText);
        assert_eq!(entry.content, "Bold move");
        assert_eq!(entry.payload.as_deref(), Some(styled.as_slice()));
        assert!(entry.blob_ref.is_some());
    }

    #[test]
    fn empty_clipboard_produces_nothing() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let (_dir, ctx) = context(clipboard.clone(), CaptureOrder::TextFirst);
        assert!(run_capture_cycle(&ctx).is_none());

        clipboard.set_text("   ");
        assert!(run_capture_cycle(&ctx).is_none());
    }
}
