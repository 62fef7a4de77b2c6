pub mod backend;
pub mod memory;
pub mod source;

pub use backend::{ClipboardBackend, NativeClipboard, detect_clipboard_backend};
pub use memory::MemoryClipboard;
pub use source::{ClipboardWrite, SystemClipboard};
