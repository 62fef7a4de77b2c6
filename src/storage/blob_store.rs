//! File-based storage for binary clipboard payloads
//!
//! Each blob is one file under `<data_dir>/blobs/`, named by its [`BlobId`]. History
//! metadata only records the id; the bytes never enter the metadata record.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::BlobId;

#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    /// Opens the blob directory, creating it if it does not exist yet.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, id: &BlobId) -> Option<PathBuf> {
        id.is_valid().then(|| self.dir.join(id.as_str()))
    }

    pub fn contains(&self, id: &BlobId) -> bool {
        self.path(id).is_some_and(|p| p.is_file())
    }

    /// Writes `bytes` under a fresh id. A failed write yields `None` and the caller
    /// keeps the payload in memory only.
    pub fn put(&self, bytes: &[u8]) -> Option<BlobId> {
        let id = BlobId::generate();
        let path = self.dir.join(id.as_str());
        let tmp = self.dir.join(format!("{}.tmp", id.as_str()));

        let written = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, &path));
        match written {
            Ok(()) => {
                debug!(blob = %id, size = bytes.len(), "Stored blob");
                Some(id)
            }
            Err(e) => {
                warn!(blob = %id, error = %e, "Failed to store blob");
                let _ = fs::remove_file(&tmp);
                None
            }
        }
    }

    pub fn get(&self, id: &BlobId) -> Option<Vec<u8>> {
        let path = self.path(id)?;
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(blob = %id, error = %e, "Failed to read blob");
                None
            }
        }
    }

    /// Best-effort removal; returns whether a file was deleted.
    pub fn delete(&self, id: &BlobId) -> bool {
        let Some(path) = self.path(id) else {
            return false;
        };
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(blob = %id, "Deleted blob");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(blob = %id, error = %e, "Failed to delete blob");
                false
            }
        }
    }

    /// Removes every blob file not named in `live`. Returns the number deleted.
    pub fn retain(&self, live: &HashSet<BlobId>) -> Result<usize> {
        let mut deleted = 0;
        for entry in fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if live.contains(&BlobId::from(name)) {
                continue;
            }
            if fs::remove_file(&path).is_ok() {
                debug!(blob = %name, "Removed orphaned blob");
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
