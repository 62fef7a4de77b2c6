pub mod display;
pub mod entry;

pub use display::display_name;
pub use entry::*;
