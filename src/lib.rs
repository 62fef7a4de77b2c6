//! Clipboard history engine
//!
//! Watches the system clipboard, classifies and deduplicates each capture, keeps a
//! bounded history with pinning, and persists it across restarts. Binary payloads
//! live in a blob directory; the history record only references them.

pub mod clipboard;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod history;
pub mod models;
pub mod monitor;
pub mod storage;
pub mod utils;

pub use config::EngineConfig;
pub use engine::ClipboardEngine;
pub use error::{EngineError, Result};
pub use history::{HistoryFilter, HistorySnapshot, InsertOutcome, OrderingPolicy};
pub use models::{ClipboardEntry, EntryId, EntryKind};
