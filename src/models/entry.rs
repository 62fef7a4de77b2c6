use std::fmt;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;
use uuid::Uuid;

use crate::utils::{FILE_SEPARATOR, format_size};

/// Raw bytes shared between the history, the capture pipeline and subscribers.
pub type Payload = Arc<[u8]>;

// ============================================================================
// IDENTIFIERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Name of a blob file inside the blob directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(String);

impl BlobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ids come back from persisted records; only plain names may reach the filesystem.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl From<&str> for BlobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ENTRY KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    Text,
    Url,
    File,
    RichText,
    Image,
    Video,
}

impl EntryKind {
    pub const ALL: [EntryKind; 6] = [
        EntryKind::Text,
        EntryKind::Url,
        EntryKind::File,
        EntryKind::RichText,
        EntryKind::Image,
        EntryKind::Video,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Text => "text",
            EntryKind::Url => "url",
            EntryKind::File => "file",
            EntryKind::RichText => "richText",
            EntryKind::Image => "image",
            EntryKind::Video => "video",
        }
    }

    /// Decodes a persisted kind name. Names written by older or newer builds that this
    /// build does not know fall back to `Text` instead of failing the whole record.
    pub fn from_persisted(raw: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .unwrap_or_else(|| {
                warn!(kind = raw, "Unknown entry kind in persisted history, using text");
                EntryKind::Text
            })
    }

    /// Kinds whose bytes live in the blob store rather than in `content`.
    pub fn carries_payload(&self) -> bool {
        matches!(self, EntryKind::Image | EntryKind::RichText)
    }

    pub fn icon(&self) -> &'static str {
        match self {
            EntryKind::Text => "📝",
            EntryKind::Url => "🔗",
            EntryKind::File => "📄",
            EntryKind::RichText => "🖋️",
            EntryKind::Image => "🖼️",
            EntryKind::Video => "🎞️",
        }
    }
}

impl<'de> Deserialize<'de> for EntryKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(EntryKind::from_persisted(&raw))
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CLIPBOARD ENTRY
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardEntry {
    pub id: EntryId,
    pub content: String,
    pub kind: EntryKind,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_ref: Option<BlobId>,
    /// SHA-256 of the payload for image entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Bytes embedded in the record by builds that predate the blob store.
    #[serde(
        rename = "data",
        default,
        skip_serializing_if = "Option::is_none",
        with = "inline_payload"
    )]
    legacy_data: Option<Payload>,
    #[serde(skip)]
    pub payload: Option<Payload>,
}

impl ClipboardEntry {
    pub fn new(kind: EntryKind, content: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            content: content.into(),
            kind,
            created_at: Utc::now(),
            pinned: false,
            blob_ref: None,
            digest: None,
            legacy_data: None,
            payload: None,
        }
    }

    pub fn new_text(content: impl Into<String>) -> Self {
        Self::new(EntryKind::Text, content)
    }

    /// An image kept inline in the metadata record, the way entries were stored
    /// before the blob store existed.
    pub fn new_legacy_image(content: impl Into<String>, bytes: impl Into<Payload>) -> Self {
        let bytes = bytes.into();
        let mut entry = Self::new(EntryKind::Image, content);
        entry.legacy_data = Some(bytes.clone());
        entry.payload = Some(bytes);
        entry
    }

    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_blob(mut self, blob_ref: Option<BlobId>) -> Self {
        self.blob_ref = blob_ref;
        self
    }

    pub fn with_digest(mut self, digest: Option<String>) -> Self {
        self.digest = digest;
        self
    }

    pub fn is_legacy(&self) -> bool {
        self.legacy_data.is_some()
    }

    /// The string duplicate-collapse compares. Image `content` is only a format
    /// label, so images that carry a digest are identified by it instead.
    pub fn identity(&self) -> &str {
        match (&self.kind, &self.digest) {
            (EntryKind::Image, Some(digest)) => digest,
            _ => &self.content,
        }
    }

    /// Moves the payload of a newer capture into this (pinned) entry. Returns the blob
    /// that is no longer referenced by anything and must be deleted.
    pub(crate) fn adopt_payload(&mut self, incoming: ClipboardEntry) -> Option<BlobId> {
        if incoming.payload.is_none() && incoming.blob_ref.is_none() {
            return None;
        }

        if self.is_legacy() {
            if let Some(payload) = incoming.payload {
                self.legacy_data = Some(payload.clone());
                self.payload = Some(payload);
                self.digest = incoming.digest;
            }
            return incoming.blob_ref;
        }

        self.payload = incoming.payload;
        self.digest = incoming.digest;
        std::mem::replace(&mut self.blob_ref, incoming.blob_ref)
    }

    /// Puts inline legacy bytes back into the transient payload after decoding.
    pub(crate) fn restore_inline_payload(&mut self) {
        if self.payload.is_none() {
            self.payload = self.legacy_data.clone();
        }
    }

    /// Individual paths of a File/Video entry, in source order.
    pub fn file_paths(&self) -> Vec<&str> {
        self.content
            .split(FILE_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn formatted_time(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }

    pub fn metadata_label(&self) -> String {
        match self.kind {
            EntryKind::Text | EntryKind::Url => format!("{} char", self.content.chars().count()),
            EntryKind::File | EntryKind::Video => {
                let count = self.file_paths().len();
                if count == 1 {
                    String::from("1 file")
                } else {
                    format!("{} files", count)
                }
            }
            EntryKind::Image | EntryKind::RichText => match &self.payload {
                Some(bytes) => format_size(bytes.len() as u64),
                None => String::from("Unknown size"),
            },
        }
    }
}

mod inline_payload {
    use super::*;

    pub fn serialize<S: Serializer>(data: &Option<Payload>, serializer: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Payload>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|encoded| match BASE64.decode(encoded.as_bytes()) {
            Ok(bytes) => Some(Payload::from(bytes)),
            Err(e) => {
                warn!(error = %e, "Dropping undecodable inline payload");
                None
            }
        }))
    }
}
