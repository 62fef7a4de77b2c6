// ============================================================================
// CONSTANTS
// ============================================================================

pub const APP_DIR_NAME: &str = "clipboard-history";
pub const CONFIG_FILE: &str = "config.json";
pub const DATA_DIR_ENV: &str = "CLIPBOARD_HISTORY_DIR";

pub const MAX_HISTORY: usize = 50;
pub const POLL_INTERVAL_MS: u64 = 500;
pub const MIN_POLL_INTERVAL_MS: u64 = 50;
pub const MAX_POLL_INTERVAL_MS: u64 = 5000;
pub const SAVE_DEBOUNCE_MS: u64 = 500;

pub const HISTORY_KEY: &str = "savedClipboardItems";
pub const HISTORY_FORMAT_VERSION: u32 = 1;
pub const BLOBS_DIR: &str = "blobs";

pub const MIN_TEXT_LEN: usize = 1;
pub const MAX_DISPLAY_LENGTH: usize = 50;
pub const MAX_URL_DISPLAY_LENGTH: usize = 30;

pub const FILE_SEPARATOR: char = '\n';
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "mkv", "webm"];
