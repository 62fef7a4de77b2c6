use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use clipboard_history::clipboard::NativeClipboard;
use clipboard_history::config::EngineConfig;
use clipboard_history::engine::ClipboardEngine;
use clipboard_history::models::display_name;
use clipboard_history::monitor::start_signal_listener;
use clipboard_history::storage::{BlobStore, FileSlotStore, read_history};
use clipboard_history::utils::HISTORY_KEY;

const PID_FILE: &str = "clipboard-history.pid";

const USAGE: &str = "\
Usage: clipboard-history [--list]

  (no arguments)  watch the clipboard and record history until SIGINT/SIGTERM
  --list          print the saved history and exit

Config: $XDG_CONFIG_HOME/clipboard-history/config.json
Logging: RUST_LOG (default: info)";

// ============================================================================
// ENTRY POINT
// ============================================================================

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = EngineConfig::load();

    let result = match args.first().map(String::as_str) {
        None => run_daemon(config),
        Some("--list") => list_history(&config),
        Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown argument: {}\n\n{}", other, USAGE);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "clipboard-history failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// ============================================================================
// DAEMON MODE
// ============================================================================

fn run_daemon(config: EngineConfig) -> clipboard_history::Result<()> {
    let data_dir = config.data_dir();
    let slot = Arc::new(FileSlotStore::open(&data_dir)?);
    let clipboard = Arc::new(NativeClipboard::detect());
    let mut engine = ClipboardEngine::open(config, clipboard, slot)?;

    write_pid_file(&data_dir);

    let shutdown_trigger = Arc::new(AtomicBool::new(false));
    start_signal_listener(Arc::clone(&shutdown_trigger));

    engine.run(&shutdown_trigger);

    remove_pid_file(&data_dir);
    info!("Shut down cleanly");
    Ok(())
}

fn write_pid_file(data_dir: &Path) {
    if let Err(e) = fs::write(data_dir.join(PID_FILE), std::process::id().to_string()) {
        warn!(error = %e, "Failed to write pid file");
    }
}

fn remove_pid_file(data_dir: &Path) {
    let _ = fs::remove_file(data_dir.join(PID_FILE));
}

// ============================================================================
// LIST MODE
// ============================================================================

fn list_history(config: &EngineConfig) -> clipboard_history::Result<()> {
    let slot = FileSlotStore::open(config.data_dir())?;
    let blobs = BlobStore::open(config.blobs_dir())?;
    // read-only: an unreadable record is reported, not discarded
    let mut entries = read_history(&slot, HISTORY_KEY, &blobs)?;
    config.ordering.sort(&mut entries);

    if entries.is_empty() {
        println!("Clipboard history is empty");
        return Ok(());
    }

    for (index, entry) in entries.iter().enumerate() {
        println!(
            "{:>3}  {} {}{:<50}  {}  {}",
            index + 1,
            entry.kind.icon(),
            if entry.pinned { "📌 " } else { "" },
            display_name(entry),
            entry.formatted_time(),
            entry.metadata_label(),
        );
    }
    Ok(())
}
