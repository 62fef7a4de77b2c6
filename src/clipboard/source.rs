use crate::error::{EngineError, Result};
use crate::models::{ClipboardEntry, EntryKind, Payload};

/// One representation to place on the system clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardWrite {
    Text(String),
    /// Encoded image bytes (PNG, JPEG, ...).
    Image(Payload),
    Files(Vec<String>),
    /// Styled bytes plus the plain fallback for targets that cannot take them.
    RichText { bytes: Payload, plain: String },
}

impl ClipboardWrite {
    /// Picks the representation matching `entry.kind`. `payload` is the entry's bytes,
    /// already resolved from memory or the blob store.
    pub fn for_entry(entry: &ClipboardEntry, payload: Option<Payload>) -> Result<Self> {
        match entry.kind {
            EntryKind::Text | EntryKind::Url => Ok(ClipboardWrite::Text(entry.content.clone())),
            EntryKind::File | EntryKind::Video => Ok(ClipboardWrite::Files(
                entry.file_paths().into_iter().map(String::from).collect(),
            )),
            EntryKind::Image => payload
                .map(ClipboardWrite::Image)
                .ok_or_else(|| EngineError::Image(format!("no image data for entry {}", entry.id))),
            EntryKind::RichText => Ok(match payload {
                Some(bytes) => ClipboardWrite::RichText {
                    bytes,
                    plain: entry.content.clone(),
                },
                None => ClipboardWrite::Text(entry.content.clone()),
            }),
        }
    }
}

/// The shared system clipboard as the engine sees it.
///
/// Reads return `None` when the representation is absent or unreadable; the poller
/// treats both the same way.
pub trait SystemClipboard: Send + Sync {
    /// Monotonic change counter. `None` when the platform offers none, in which case
    /// every poll is a candidate change and fingerprints decide.
    fn change_count(&self) -> Option<u64>;

    fn read_text(&self) -> Option<String>;

    /// Encoded image bytes.
    fn read_image(&self) -> Option<Vec<u8>>;

    fn read_files(&self) -> Option<Vec<String>>;

    fn read_rich_text(&self) -> Option<Vec<u8>>;

    fn write(&self, content: &ClipboardWrite) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_urls_write_plain_strings() {
        let url = ClipboardEntry::new(EntryKind::Url, "https://example.com");
        assert_eq!(
            ClipboardWrite::for_entry(&url, None).unwrap(),
            ClipboardWrite::Text("https://example.com".into())
        );
    }

    #[test]
    fn file_entries_split_back_into_paths() {
        let files = ClipboardEntry::new(EntryKind::File, "/a/one.txt\n/b/two.txt");
        assert_eq!(
            ClipboardWrite::for_entry(&files, None).unwrap(),
            ClipboardWrite::Files(vec!["/a/one.txt".into(), "/b/two.txt".into()])
        );
        let video = ClipboardEntry::new(EntryKind::Video, "/v/clip.mp4");
        assert_eq!(
            ClipboardWrite::for_entry(&video, None).unwrap(),
            ClipboardWrite::Files(vec!["/v/clip.mp4".into()])
        );
    }

    #[test]
    fn image_without_bytes_is_an_error() {
        let image = ClipboardEntry::new(EntryKind::Image, "Image.png");
        assert!(matches!(
            ClipboardWrite::for_entry(&image, None),
            Err(EngineError::Image(_))
        ));
    }

    #[test]
    fn rich_text_falls_back_to_plain() {
        let entry = ClipboardEntry::new(EntryKind::RichText, "bold");
        assert_eq!(
            ClipboardWrite::for_entry(&entry, None).unwrap(),
            ClipboardWrite::Text("bold".into())
        );

        let bytes: Payload = Payload::from(&b"{\\rtf1 \\b bold}"[..]);
        assert_eq!(
            ClipboardWrite::for_entry(&entry, Some(bytes.clone())).unwrap(),
            ClipboardWrite::RichText {
                bytes,
                plain: "bold".into()
            }
        );
    }
}
