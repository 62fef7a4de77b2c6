use std::io::Cursor;
use std::path::Path;

use url::Url;

use crate::content::ImageFormat;
use crate::models::{ClipboardEntry, EntryKind};
use crate::utils::{MAX_DISPLAY_LENGTH, MAX_URL_DISPLAY_LENGTH, truncate_chars};

// ============================================================================
// DISPLAY NAMES
// ============================================================================

/// Short human label for an entry. Derived on demand, never stored.
pub fn display_name(entry: &ClipboardEntry) -> String {
    match entry.kind {
        EntryKind::Image => image_name(entry.payload.as_deref()),
        EntryKind::File | EntryKind::Video => file_name(&entry.file_paths()),
        EntryKind::Url => url_name(&entry.content),
        EntryKind::Text | EntryKind::RichText => text_name(&entry.content),
    }
}

pub fn image_name(bytes: Option<&[u8]>) -> String {
    let Some(bytes) = bytes else {
        return String::from("Image");
    };

    let dimensions = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_dimensions().ok());

    match dimensions {
        Some((width, height)) => {
            format!("{} Image {}×{}", ImageFormat::sniff(bytes).name(), width, height)
        }
        None => String::from("Image"),
    }
}

pub fn file_name(paths: &[&str]) -> String {
    match paths {
        [] => String::from("File"),
        [single] => single_file_name(single),
        [first, ..] => format!("{} Files: {}", paths.len(), single_file_name(first)),
    }
}

fn single_file_name(path: &str) -> String {
    let is_dir = path.ends_with('/');
    let name = last_path_segment(path);
    match name {
        Some(name) => name,
        None if is_dir => String::from("Folder"),
        None => String::from("File"),
    }
}

fn last_path_segment(path: &str) -> Option<String> {
    if path.starts_with("file://") {
        if let Some(name) = Url::parse(path)
            .ok()
            .and_then(|url| url.to_file_path().ok())
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        {
            return Some(name);
        }
    }

    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
}

pub fn url_name(content: &str) -> String {
    if content.is_empty() {
        return String::from("URL");
    }

    let Ok(url) = Url::parse(content) else {
        return truncate_chars(content, MAX_URL_DISPLAY_LENGTH);
    };

    let last_segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    if url.scheme() == "file" {
        return last_segment.unwrap_or_else(|| String::from("File"));
    }

    if let Some(segment) = last_segment.as_deref() {
        if Path::new(segment).extension().is_some() {
            return segment.to_string();
        }
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => truncate_chars(content, MAX_URL_DISPLAY_LENGTH),
    }
}

pub fn text_name(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return String::from("Empty Text");
    }
    truncate_chars(trimmed, MAX_DISPLAY_LENGTH)
}
