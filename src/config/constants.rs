//! Constants for hamly

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Full path of the executable file
pub static EXECUTABLE_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Directory next to the executable that receives log files
pub const LOGS_DIR: &str = "logs";

/// Extensions picked up when walking source directories
pub const SOURCE_EXTENSIONS: &[&str] = &["txt", "html", "htm"];

/// Extension appended to escaped output files
pub const OUTPUT_EXTENSION: &str = "html";

/// How long the watcher waits for a single event before checking pending changes
pub const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Quiet period after the last change before files are re-escaped
pub const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

pub fn init_constants() {
    // A second call keeps the first value
    if let Ok(exe_path) = std::env::current_exe() {
        let _ = EXECUTABLE_PATH.set(exe_path);
    }
}
