pub mod classifier;
pub mod fingerprint;
pub mod image_format;
pub mod rich_text;

pub use classifier::{Classified, RawPayload, classify, looks_like_url};
pub use fingerprint::{FingerprintCategory, FingerprintTracker, content_digest};
pub use image_format::ImageFormat;
pub use rich_text::decode_styled_text;
