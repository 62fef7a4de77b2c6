use thiserror::Error;

use crate::models::EntryId;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("clipboard error: {0}")]
    Clipboard(String),
    #[error("image error: {0}")]
    Image(String),
    #[error("no history entry with id {0}")]
    UnknownEntry(EntryId),
}

pub type Result<T> = std::result::Result<T, EngineError>;
