pub mod manager;
pub mod ordering;
pub mod query;

pub use manager::{ClipboardHistory, HistorySnapshot, InsertOutcome};
pub use ordering::OrderingPolicy;
pub use query::{DateSection, HistoryFilter, Section, group_by_section, group_by_section_now, search};
