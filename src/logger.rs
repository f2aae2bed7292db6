//! Session logger: routes `tracing` output to a single file in the OS data
//! directory, optionally mirrored to stderr.
//!
//! The file is **truncated at each launch**, so it only ever contains output
//! from the most-recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\LayerPaint\layerpaint.log`
//!   Linux:    `~/.local/share/LayerPaint/layerpaint.log`
//!   macOS:    `~/Library/Application Support/LayerPaint/layerpaint.log`
//!
//! Verbosity follows `RUST_LOG` and defaults to `layerpaint=info`.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "layerpaint=info";

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Returns the path to the current session log file.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Initialise logging. Safe to call more than once; only the first call
/// installs the subscriber and panic hook.
///
/// * Creates (or truncates) the session log file. Failing to open it is not
///   fatal: logging then goes to stderr only if `echo_stderr` is set.
/// * Installs a panic hook that records the panic before handing it to the
///   previous hook.
pub fn init(echo_stderr: bool) {
    let path = log_file_path();
    let (file, open_error) = match open_truncated(&path) {
        Ok(f) => (Some(f), None),
        Err(e) => (None, Some(e)),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let file_layer = file.map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));
    let stderr_layer = echo_stderr.then(|| fmt::layer().with_writer(std::io::stderr));

    if tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_err()
    {
        return;
    }

    match open_error {
        None => {
            tracing::info!("=== LayerPaint session started ===");
            tracing::info!("Log file: {}", path.display());
            let _ = LOG_PATH.set(path);
        }
        Some(e) => {
            tracing::warn!("failed to open log file {:?}: {}", path, e);
        }
    }

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC: {}", info);
        prev(info);
    }));
}

fn open_truncated(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}

fn log_file_path() -> PathBuf {
    data_dir().join("LayerPaint").join("layerpaint.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    // Linux / fallback
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort: current working directory
    PathBuf::from(".")
}
