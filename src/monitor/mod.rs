pub mod capture;
pub mod poller;
pub mod signal;
pub mod wayland;

pub use capture::{CaptureContext, read_clipboard, run_capture_cycle};
pub use poller::{CaptureOrder, ChangePoller, CycleGuard, Representation};
pub use signal::start_signal_listener;
pub use wayland::ChangeWatcher;
