//! Logging utilities for hamly

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::constants::{EXECUTABLE_PATH, LOGS_DIR};

/// Generate unique log file path based on current directory, PID, and timestamp
pub fn get_log_file_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let current_dir = std::env::current_dir()?;
    let folder_name = current_dir
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("unknown"))
        .to_string_lossy();

    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let pid = std::process::id();

    let logs_dir = EXECUTABLE_PATH
        .get()
        .ok_or("EXECUTABLE_PATH not initialized")?
        .parent()
        .ok_or("Cannot get executable parent directory")?
        .join(LOGS_DIR);

    std::fs::create_dir_all(&logs_dir)?;

    let log_filename = format!("{folder_name}_{pid}_{timestamp}.log");
    Ok(logs_dir.join(log_filename))
}

/// Create log file with proper options
pub fn create_log_file() -> Result<std::fs::File, Box<dyn std::error::Error>> {
    let log_path = get_log_file_path()?;

    let log_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)?;

    eprintln!("Log file created: {}", log_path.display());

    Ok(log_file)
}

/// Install the stderr layer and, when a file is given, a debug-level file layer.
///
/// Escaped text goes to stdout, so console logging stays on stderr.
pub fn init_tracing(log_file: Option<std::fs::File>) {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let file = log_file.map(|file| {
        fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_filter(EnvFilter::new("debug"))
    });

    tracing_subscriber::registry().with(console).with(file).init();
}
