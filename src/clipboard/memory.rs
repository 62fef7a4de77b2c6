use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::clipboard::{ClipboardWrite, SystemClipboard};
use crate::error::{EngineError, Result};

#[derive(Debug, Default)]
struct MemoryState {
    change_count: u64,
    text: Option<String>,
    image: Option<Vec<u8>>,
    files: Option<Vec<String>>,
    rich_text: Option<Vec<u8>>,
    writes: Vec<ClipboardWrite>,
    reads: usize,
    read_delay: Option<Duration>,
    fail_writes: bool,
    /// Write bumps not yet visible through the counter.
    unseen_writes: u64,
}

impl MemoryState {
    fn replace(&mut self) {
        self.change_count += 1;
        self.text = None;
        self.image = None;
        self.files = None;
        self.rich_text = None;
    }
}

/// An in-process clipboard. Every `set_*` call acts like a copy in another
/// application: it replaces all representations and bumps the change counter.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    state: Mutex<MemoryState>,
    counterless: bool,
    lagging: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that reports no change counter, like platforms without one.
    pub fn without_counter() -> Self {
        Self {
            counterless: true,
            ..Self::default()
        }
    }

    /// A clipboard whose counter shows the engine's writes one sample late, like a
    /// counter fed by a separate watcher process.
    pub fn with_lagging_counter() -> Self {
        Self {
            lagging: true,
            ..Self::default()
        }
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let mut state = self.state.lock();
        state.replace();
        state.text = Some(text.into());
    }

    pub fn set_image(&self, bytes: impl Into<Vec<u8>>) {
        let mut state = self.state.lock();
        state.replace();
        state.image = Some(bytes.into());
    }

    pub fn set_files<S: Into<String>>(&self, paths: impl IntoIterator<Item = S>) {
        let mut state = self.state.lock();
        state.replace();
        state.files = Some(paths.into_iter().map(Into::into).collect());
    }

    /// Styled bytes with an optional plain-text representation beside them.
    pub fn set_rich_text(&self, bytes: impl Into<Vec<u8>>, plain: Option<String>) {
        let mut state = self.state.lock();
        state.replace();
        state.rich_text = Some(bytes.into());
        state.text = plain;
    }

    pub fn clear(&self) {
        self.state.lock().replace();
    }

    /// Writes the engine made, oldest first.
    pub fn writes(&self) -> Vec<ClipboardWrite> {
        self.state.lock().writes.clone()
    }

    /// Number of representation reads so far.
    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }

    /// Makes every read sleep, to hold a capture cycle open.
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        self.state.lock().read_delay = delay;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    fn read<T>(&self, pick: impl FnOnce(&MemoryState) -> Option<T>) -> Option<T> {
        let delay = {
            let mut state = self.state.lock();
            state.reads += 1;
            state.read_delay
        };
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        pick(&self.state.lock())
    }
}

impl SystemClipboard for MemoryClipboard {
    fn change_count(&self) -> Option<u64> {
        if self.counterless {
            return None;
        }
        let mut state = self.state.lock();
        let count = state.change_count;
        let unseen = std::mem::take(&mut state.unseen_writes);
        state.change_count += unseen;
        Some(count)
    }

    fn read_text(&self) -> Option<String> {
        self.read(|s| s.text.clone())
    }

    fn read_image(&self) -> Option<Vec<u8>> {
        self.read(|s| s.image.clone())
    }

    fn read_files(&self) -> Option<Vec<String>> {
        self.read(|s| s.files.clone())
    }

    fn read_rich_text(&self) -> Option<Vec<u8>> {
        self.read(|s| s.rich_text.clone())
    }

    fn write(&self, content: &ClipboardWrite) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(EngineError::Clipboard("memory clipboard rejected the write".into()));
        }
        state.replace();
        if self.lagging {
            state.change_count -= 1;
            state.unseen_writes += 1;
        }
        match content {
            ClipboardWrite::Text(text) => state.text = Some(text.clone()),
            ClipboardWrite::Image(bytes) => state.image = Some(bytes.to_vec()),
            ClipboardWrite::Files(paths) => state.files = Some(paths.clone()),
            ClipboardWrite::RichText { bytes, plain } => {
                state.rich_text = Some(bytes.to_vec());
                state.text = Some(plain.clone());
            }
        }
        state.writes.push(content.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_copy_replaces_all_representations() {
        let clipboard = MemoryClipboard::new();
        assert_eq!(clipboard.change_count(), Some(0));

        clipboard.set_text("hello");
        clipboard.set_image(vec![1u8, 2]);
        assert_eq!(clipboard.change_count(), Some(2));
        assert_eq!(clipboard.read_text(), None);
        assert_eq!(clipboard.read_image(), Some(vec![1, 2]));
    }

    #[test]
    fn writes_are_recorded_and_counted() {
        let clipboard = MemoryClipboard::new();
        let write = ClipboardWrite::Files(vec!["/a".into()]);
        clipboard.write(&write).unwrap();

        assert_eq!(clipboard.writes(), vec![write]);
        assert_eq!(clipboard.read_files(), Some(vec!["/a".to_string()]));
        assert_eq!(clipboard.change_count(), Some(1));
    }

    #[test]
    fn failing_writes_leave_the_clipboard_alone() {
        let clipboard = MemoryClipboard::new();
        clipboard.set_text("kept");
        clipboard.set_fail_writes(true);

        assert!(clipboard.write(&ClipboardWrite::Text("lost".into())).is_err());
        assert_eq!(clipboard.read_text().as_deref(), Some("kept"));
        assert!(clipboard.writes().is_empty());
    }

    #[test]
    fn lagging_counter_shows_writes_one_sample_late() {
        let clipboard = MemoryClipboard::with_lagging_counter();
        clipboard.write(&ClipboardWrite::Text("late".into())).unwrap();

        assert_eq!(clipboard.change_count(), Some(0));
        assert_eq!(clipboard.change_count(), Some(1));
        clipboard.set_text("external");
        assert_eq!(clipboard.change_count(), Some(2));
    }

    #[test]
    fn counterless_clipboard_reports_none() {
        let clipboard = MemoryClipboard::without_counter();
        clipboard.set_text("x");
        assert_eq!(clipboard.change_count(), None);
    }
}
