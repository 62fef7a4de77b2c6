use std::path::Path;

use tracing::debug;
use url::Url;

use crate::content::fingerprint::content_digest;
use crate::content::image_format::ImageFormat;
use crate::content::rich_text::decode_styled_text;
use crate::models::{ClipboardEntry, EntryKind};
use crate::utils::{FILE_SEPARATOR, MIN_TEXT_LEN, VIDEO_EXTENSIONS};

// ============================================================================
// RAW PAYLOADS
// ============================================================================

/// One representation read from the system clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPayload {
    Text(String),
    Image(Vec<u8>),
    Files(Vec<String>),
    RichText(Vec<u8>),
}

/// Result of classification, ready to become a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: EntryKind,
    pub content: String,
    pub payload: Option<Vec<u8>>,
    pub digest: Option<String>,
}

impl Classified {
    fn textual(kind: EntryKind, content: String) -> Self {
        Self {
            kind,
            content,
            payload: None,
            digest: None,
        }
    }

    pub fn into_entry(self) -> ClipboardEntry {
        let mut entry = ClipboardEntry::new(self.kind, self.content).with_digest(self.digest);
        if let Some(bytes) = self.payload {
            entry = entry.with_payload(bytes);
        }
        entry
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Returns `None` for payloads that must not produce an entry: blank text, empty file
/// lists, empty images and styled text that cannot be decoded.
pub fn classify(raw: RawPayload) -> Option<Classified> {
    match raw {
        RawPayload::Text(text) => classify_text(&text),
        RawPayload::Image(bytes) => classify_image(bytes),
        RawPayload::Files(paths) => classify_files(&paths),
        RawPayload::RichText(bytes) => classify_rich_text(bytes),
    }
}

fn classify_text(text: &str) -> Option<Classified> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_TEXT_LEN {
        debug!("Skipping blank clipboard text");
        return None;
    }

    let kind = if looks_like_url(trimmed) {
        EntryKind::Url
    } else {
        EntryKind::Text
    };
    Some(Classified::textual(kind, trimmed.to_string()))
}

/// A URL is a single token that parses with a non-empty scheme.
pub fn looks_like_url(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    Url::parse(text).is_ok_and(|url| !url.scheme().is_empty())
}

fn classify_image(bytes: Vec<u8>) -> Option<Classified> {
    if bytes.is_empty() {
        return None;
    }

    let format = ImageFormat::sniff(&bytes);
    let digest = content_digest(&bytes);
    Some(Classified {
        kind: EntryKind::Image,
        content: format.content_label(),
        payload: Some(bytes),
        digest: Some(digest),
    })
}

fn classify_files(paths: &[String]) -> Option<Classified> {
    let paths: Vec<&str> = paths
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();

    match paths.as_slice() {
        [] => None,
        [single] if is_video_path(single) => {
            Some(Classified::textual(EntryKind::Video, single.to_string()))
        }
        _ => Some(Classified::textual(
            EntryKind::File,
            paths.join(&FILE_SEPARATOR.to_string()),
        )),
    }
}

fn is_video_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn classify_rich_text(bytes: Vec<u8>) -> Option<Classified> {
    let Some(plain) = decode_styled_text(&bytes) else {
        debug!(size = bytes.len(), "Skipping undecodable rich text");
        return None;
    };

    let trimmed = plain.trim();
    if trimmed.chars().count() < MIN_TEXT_LEN {
        return None;
    }

    Some(Classified {
        kind: EntryKind::RichText,
        content: trimmed.to_string(),
        payload: Some(bytes),
        digest: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed_and_blank_text_dropped() {
        let classified = classify(RawPayload::Text("  hello world \n".into())).unwrap();
        assert_eq!(classified.kind, EntryKind::Text);
        assert_eq!(classified.content, "hello world");

        assert!(classify(RawPayload::Text("   \n\t".into())).is_none());
        assert!(classify(RawPayload::Text(String::new())).is_none());
    }

    #[test]
    fn urls_need_a_scheme_and_no_spaces() {
        let url = classify(RawPayload::Text(" https://example.com/a?b=1 ".into())).unwrap();
        assert_eq!(url.kind, EntryKind::Url);
        assert_eq!(url.content, "https://example.com/a?b=1");

        assert_eq!(classify(RawPayload::Text("example.com".into())).unwrap().kind, EntryKind::Text);
        assert_eq!(classify(RawPayload::Text("note: buy milk".into())).unwrap().kind, EntryKind::Text);
        assert_eq!(classify(RawPayload::Text("mailto:a@b.c".into())).unwrap().kind, EntryKind::Url);
    }

    #[test]
    fn files_join_with_newlines_in_source_order() {
        let classified =
            classify(RawPayload::Files(vec!["/tmp/b.txt".into(), "/tmp/a.txt".into()])).unwrap();
        assert_eq!(classified.kind, EntryKind::File);
        assert_eq!(classified.content, "/tmp/b.txt\n/tmp/a.txt");

        assert!(classify(RawPayload::Files(vec![])).is_none());
        assert!(classify(RawPayload::Files(vec!["  ".into()])).is_none());
    }

    #[test]
    fn single_video_path_is_a_video() {
        let classified = classify(RawPayload::Files(vec!["/home/me/clip.MP4".into()])).unwrap();
        assert_eq!(classified.kind, EntryKind::Video);

        let two = classify(RawPayload::Files(vec!["/a.mp4".into(), "/b.mp4".into()])).unwrap();
        assert_eq!(two.kind, EntryKind::File);
    }

    #[test]
    fn image_label_names_the_sniffed_format() {
        let png = b"\x89PNG\r\n\x1a\nrest".to_vec();
        let classified = classify(RawPayload::Image(png.clone())).unwrap();
        assert_eq!(classified.kind, EntryKind::Image);
        assert_eq!(classified.content, "Image.png");
        assert_eq!(classified.payload, Some(png.clone()));
        assert_eq!(classified.digest, Some(content_digest(&png)));

        let unknown = classify(RawPayload::Image(vec![1, 2, 3, 4])).unwrap();
        assert_eq!(unknown.content, "Image.tiff");
        assert!(classify(RawPayload::Image(vec![])).is_none());
    }

    #[test]
    fn rich_text_keeps_styled_bytes() {
        let rtf = br"{\rtf1\ansi Bold \b move\b0}".to_vec();
        let classified = classify(RawPayload::RichText(rtf.clone())).unwrap();
        assert_eq!(classified.kind, EntryKind::RichText);
        assert_eq!(classified.content, "Bold move");
        assert_eq!(classified.payload, Some(rtf));

        assert!(classify(RawPayload::RichText(vec![0xC3, 0x28])).is_none());
    }

    #[test]
    fn into_entry_carries_payload_and_digest() {
        let entry = classify(RawPayload::Image(vec![0xFF, 0xD8, 0xFF, 0x00]))
            .unwrap()
            .into_entry();
        assert_eq!(entry.content, "Image.jpg");
        assert!(entry.payload.is_some());
        assert!(entry.digest.is_some());
        assert!(!entry.pinned);
    }
}
