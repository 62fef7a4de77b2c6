pub mod blob_store;
pub mod kv;
pub mod persistence;

pub use blob_store::BlobStore;
pub use kv::{FileSlotStore, KeyValueStore, MemorySlotStore};
pub use persistence::{PersistenceGateway, decode_history, encode_history, load_history, read_history};
