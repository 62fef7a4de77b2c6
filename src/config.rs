use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::history::OrderingPolicy;
use crate::monitor::CaptureOrder;
use crate::utils::{
    APP_DIR_NAME, BLOBS_DIR, CONFIG_FILE, DATA_DIR_ENV, MAX_HISTORY, MAX_POLL_INTERVAL_MS,
    MIN_POLL_INTERVAL_MS, POLL_INTERVAL_MS, SAVE_DEBOUNCE_MS,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where history and blobs live. Falls back to `$CLIPBOARD_HISTORY_DIR`, then the
    /// platform data directory.
    pub data_dir: Option<PathBuf>,
    pub max_history: usize,
    pub poll_interval_ms: u64,
    pub save_debounce_ms: u64,
    pub ordering: OrderingPolicy,
    pub capture_order: CaptureOrder,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_history: MAX_HISTORY,
            poll_interval_ms: POLL_INTERVAL_MS,
            save_debounce_ms: SAVE_DEBOUNCE_MS,
            ordering: OrderingPolicy::default(),
            capture_order: CaptureOrder::default(),
        }
    }
}

impl EngineConfig {
    /// A config rooted at `data_dir`, everything else default.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE))
    }

    /// Reads the config at the default location. A missing or malformed file yields
    /// defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match Self::read(path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Option<Self>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(dir);
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir().join(BLOBS_DIR)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.poll_interval_ms
                .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS),
        )
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_from(&dir.path().join("absent.json"));
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_history, 50);
        assert_eq!(config.ordering, OrderingPolicy::Recency);
        assert_eq!(config.capture_order, CaptureOrder::TextFirst);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"max_history": 10, "ordering": "grouped_format", "capture_order": "files_first"}"#,
        )
        .unwrap();

        let config = EngineConfig::load_from(&path);
        assert_eq!(config.max_history, 10);
        assert_eq!(config.ordering, OrderingPolicy::GroupedFormat);
        assert_eq!(config.capture_order, CaptureOrder::FilesFirst);
        assert_eq!(config.poll_interval_ms, POLL_INTERVAL_MS);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(EngineConfig::load_from(&path), EngineConfig::default());
    }

    #[test]
    fn poll_interval_is_clamped() {
        let mut config = EngineConfig {
            poll_interval_ms: 1,
            ..EngineConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(MIN_POLL_INTERVAL_MS));
        config.poll_interval_ms = 60_000;
        assert_eq!(config.poll_interval(), Duration::from_millis(MAX_POLL_INTERVAL_MS));
    }

    #[test]
    fn explicit_data_dir_wins() {
        let config = EngineConfig::with_data_dir("/tmp/history-here");
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/history-here"));
        assert_eq!(config.blobs_dir(), PathBuf::from("/tmp/history-here/blobs"));
    }
}
