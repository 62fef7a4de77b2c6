use std::env;
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use arboard::Clipboard;
use tracing::{debug, info};
use url::Url;

use crate::clipboard::{ClipboardWrite, SystemClipboard};
use crate::content::ImageFormat;
use crate::error::{EngineError, Result};
use crate::monitor::ChangeWatcher;

// ============================================================================
// CLIPBOARD BACKEND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardBackend {
    WlClipboard,
    Arboard,
}

pub fn detect_clipboard_backend() -> ClipboardBackend {
    if (env::var("WAYLAND_DISPLAY").is_ok()
        || env::var("XDG_SESSION_TYPE").is_ok_and(|v| v == "wayland"))
        && Command::new("wl-paste").arg("--version").output().is_ok()
    {
        ClipboardBackend::WlClipboard
    } else {
        ClipboardBackend::Arboard
    }
}

const IMAGE_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
];

const RICH_TEXT_MIME_TYPES: &[&str] = &["text/rtf", "application/rtf", "text/richtext"];

const URI_LIST_MIME: &str = "text/uri-list";

// ============================================================================
// NATIVE CLIPBOARD
// ============================================================================

/// The desktop clipboard, reached through `wl-clipboard` on Wayland and `arboard`
/// everywhere else.
pub struct NativeClipboard {
    backend: ClipboardBackend,
    watcher: Option<ChangeWatcher>,
}

impl NativeClipboard {
    pub fn detect() -> Self {
        Self::with_backend(detect_clipboard_backend())
    }

    /// On Wayland a `wl-paste --watch` process feeds the change counter; without it
    /// the poller falls back to fingerprint comparison on every tick.
    pub fn with_backend(backend: ClipboardBackend) -> Self {
        let watcher = match backend {
            ClipboardBackend::WlClipboard => ChangeWatcher::spawn(),
            ClipboardBackend::Arboard => None,
        };
        info!(?backend, change_counter = watcher.is_some(), "Clipboard backend ready");
        Self { backend, watcher }
    }

    pub fn backend(&self) -> ClipboardBackend {
        self.backend
    }
}

impl SystemClipboard for NativeClipboard {
    fn change_count(&self) -> Option<u64> {
        self.watcher.as_ref().map(ChangeWatcher::count)
    }

    fn read_text(&self) -> Option<String> {
        get_clipboard_text(self.backend)
    }

    fn read_image(&self) -> Option<Vec<u8>> {
        get_clipboard_image(self.backend)
    }

    fn read_files(&self) -> Option<Vec<String>> {
        match self.backend {
            ClipboardBackend::WlClipboard => {
                if !get_clipboard_types(self.backend).iter().any(|t| t == URI_LIST_MIME) {
                    return None;
                }
                let list = wl_paste(URI_LIST_MIME)?;
                let paths = parse_uri_list(&String::from_utf8_lossy(&list));
                (!paths.is_empty()).then_some(paths)
            }
            ClipboardBackend::Arboard => None,
        }
    }

    fn read_rich_text(&self) -> Option<Vec<u8>> {
        match self.backend {
            ClipboardBackend::WlClipboard => {
                let types = get_clipboard_types(self.backend);
                RICH_TEXT_MIME_TYPES
                    .iter()
                    .filter(|mime| types.iter().any(|t| t == *mime))
                    .find_map(|mime| wl_paste(mime))
            }
            ClipboardBackend::Arboard => None,
        }
    }

    fn write(&self, content: &ClipboardWrite) -> Result<()> {
        match (self.backend, content) {
            (backend, ClipboardWrite::Text(text)) => set_clipboard_text(text, backend),
            (backend, ClipboardWrite::Image(bytes)) => set_clipboard_image(bytes, backend),
            (ClipboardBackend::WlClipboard, ClipboardWrite::Files(paths)) => {
                let list = to_uri_list(paths);
                pipe_to_wl_copy(URI_LIST_MIME, list.as_bytes())
            }
            (ClipboardBackend::WlClipboard, ClipboardWrite::RichText { bytes, .. }) => {
                pipe_to_wl_copy("text/rtf", bytes)
            }
            (ClipboardBackend::Arboard, ClipboardWrite::Files(paths)) => {
                debug!("arboard cannot place file lists, writing paths as text");
                set_clipboard_text(&paths.join("\n"), ClipboardBackend::Arboard)
            }
            (ClipboardBackend::Arboard, ClipboardWrite::RichText { plain, .. }) => {
                set_clipboard_text(plain, ClipboardBackend::Arboard)
            }
        }
    }
}

// ============================================================================
// READS
// ============================================================================

pub fn get_clipboard_types(backend: ClipboardBackend) -> Vec<String> {
    match backend {
        ClipboardBackend::WlClipboard => Command::new("wl-paste")
            .arg("--list-types")
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| {
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        ClipboardBackend::Arboard => Vec::new(),
    }
}

pub fn get_clipboard_text(backend: ClipboardBackend) -> Option<String> {
    match backend {
        ClipboardBackend::WlClipboard => Command::new("wl-paste")
            .args(["--no-newline", "--type", "text"])
            .output()
            .ok()
            .filter(|output| output.status.success())
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .filter(|s| !s.trim().is_empty()),
        ClipboardBackend::Arboard => Clipboard::new()
            .ok()
            .and_then(|mut cb| cb.get_text().ok())
            .filter(|s| !s.trim().is_empty()),
    }
}

pub fn get_clipboard_image(backend: ClipboardBackend) -> Option<Vec<u8>> {
    match backend {
        ClipboardBackend::WlClipboard => {
            let types = get_clipboard_types(backend);
            IMAGE_MIME_TYPES
                .iter()
                .filter(|mime| types.iter().any(|t| t == *mime))
                .find_map(|mime| wl_paste(mime))
        }
        ClipboardBackend::Arboard => Clipboard::new()
            .ok()
            .and_then(|mut cb| cb.get_image().ok())
            .and_then(|img| {
                use image::{ImageBuffer, RgbaImage};

                let buffer: RgbaImage =
                    ImageBuffer::from_raw(img.width as u32, img.height as u32, img.bytes.to_vec())?;

                let mut png_data = Vec::new();
                buffer
                    .write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
                    .ok()?;

                Some(png_data)
            }),
    }
}

fn wl_paste(mime_type: &str) -> Option<Vec<u8>> {
    Command::new("wl-paste")
        .arg("--type")
        .arg(mime_type)
        .output()
        .ok()
        .filter(|output| output.status.success() && !output.stdout.is_empty())
        .map(|output| output.stdout)
}

/// Local paths from a `text/uri-list` body, in order. Comments and non-file URIs
/// are skipped.
pub fn parse_uri_list(list: &str) -> Vec<String> {
    list.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match Url::parse(line) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .ok()
                .map(|p| p.to_string_lossy().into_owned()),
            Ok(_) => None,
            Err(_) => line.starts_with('/').then(|| line.to_string()),
        })
        .collect()
}

pub fn to_uri_list(paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| {
            Url::from_file_path(p)
                .map(String::from)
                .unwrap_or_else(|_| p.clone())
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

// ============================================================================
// WRITES
// ============================================================================

pub fn set_clipboard_text(content: &str, backend: ClipboardBackend) -> Result<()> {
    match backend {
        ClipboardBackend::WlClipboard => {
            let output = Command::new("wl-copy")
                .arg("--")
                .arg(content)
                .output()
                .map_err(|e| EngineError::Clipboard(format!("failed to run wl-copy: {}", e)))?;
            if output.status.success() {
                Ok(())
            } else {
                Err(EngineError::Clipboard(format!(
                    "wl-copy failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                )))
            }
        }
        ClipboardBackend::Arboard => Clipboard::new()
            .and_then(|mut cb| cb.set_text(content))
            .map_err(|e| EngineError::Clipboard(format!("failed to set text: {}", e))),
    }
}

pub fn set_clipboard_image(bytes: &[u8], backend: ClipboardBackend) -> Result<()> {
    match backend {
        ClipboardBackend::WlClipboard => {
            pipe_to_wl_copy(ImageFormat::sniff(bytes).mime_type(), bytes)
        }
        ClipboardBackend::Arboard => {
            let img = image::load_from_memory(bytes)
                .map_err(|e| EngineError::Image(format!("failed to decode image: {}", e)))?;

            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();

            let img_data = arboard::ImageData {
                width: width as usize,
                height: height as usize,
                bytes: rgba.into_raw().into(),
            };

            Clipboard::new()
                .and_then(|mut cb| cb.set_image(img_data))
                .map_err(|e| EngineError::Clipboard(format!("failed to set image: {}", e)))
        }
    }
}

fn pipe_to_wl_copy(mime_type: &str, bytes: &[u8]) -> Result<()> {
    let mut child = Command::new("wl-copy")
        .arg("--type")
        .arg(mime_type)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| EngineError::Clipboard(format!("failed to spawn wl-copy: {}", e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(bytes)
            .map_err(|e| EngineError::Clipboard(format!("failed to write to wl-copy: {}", e)))?;
    }

    let status = child
        .wait()
        .map_err(|e| EngineError::Clipboard(format!("wl-copy failed: {}", e)))?;
    if status.success() {
        Ok(())
    } else {
        Err(EngineError::Clipboard(format!("wl-copy exited with {}", status)))
    }
}
