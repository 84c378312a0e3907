//! Logging initialization.
//!
//! Logs go to a file so they never draw over the TUI. Each run gets its own
//! file under `~/.rusty-ide/logs/`, e.g. `rusty-ide.2024-12-06-14-30-25.log`.
//!
//! # Configuration
//!
//! The log level comes from `RUST_LOG` (`debug`, `info`, `warn`, `error`),
//! defaulting to `info`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directory holding the per-run log files.
pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".rusty-ide").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// `rusty-ide.<timestamp>.log` inside `dir`.
fn log_file_path(dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    dir.join(format!("rusty-ide.{timestamp}.log"))
}

/// Initialize file logging.
///
/// The returned guard flushes the non-blocking writer when dropped, so the
/// caller keeps it alive for the whole run. Returns `None` (and logs
/// nothing) when the log file cannot be created.
pub fn init_logging() -> Option<WorkerGuard> {
    let dir = log_dir();
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("Warning: Failed to create logs directory: {}", e);
        return None;
    }

    let log_path = log_file_path(&dir);
    let log_file = match fs::File::create(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: Failed to create log file: {}", e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized - writing to {}", log_path.display());
    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        let path = log_file_path(Path::new("/var/log/ide"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(path.starts_with("/var/log/ide"));
        assert!(name.starts_with("rusty-ide."));
        assert!(name.ends_with(".log"));
        // rusty-ide. + YYYY-mm-dd-HH-MM-SS + .log
        assert_eq!(name.len(), "rusty-ide.".len() + 19 + ".log".len());
    }
}
