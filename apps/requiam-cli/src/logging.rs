//! Tracing subscriber setup.
//!
//! Console output is human-readable by default or JSON lines when
//! `logging.json` is set. With `logging.dir` every event is also appended,
//! without ANSI colors, to a dated file such as `requiam.2024-05-01.log`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;
use crate::error::{CliError, CliResult};

/// Initialize the global subscriber. Returns the log file path, if any.
///
/// `RUST_LOG` takes precedence over `settings.level`.
pub fn init_logging(settings: &LoggingSettings) -> CliResult<Option<PathBuf>> {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| {
            CliError::Config(format!("invalid log filter {}: {e}", settings.level))
        })?;

    let (json_layer, text_layer) = if settings.json {
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true);
        (Some(layer), None)
    } else {
        (None, Some(fmt::layer().with_target(false)))
    };

    let (file_layer, log_path) = match &settings.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                CliError::Io(format!("cannot create log directory {}: {e}", dir.display()))
            })?;
            let path = log_file_path(dir, chrono::Local::now().date_naive());
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| CliError::Io(format!("cannot open {}: {e}", path.display())))?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .with(filter_layer)
        .try_init()
        .map_err(|e| CliError::Config(format!("logging already initialized: {e}")))?;

    tracing::debug!(filter = %settings.level, log_file = ?log_path, "Logging initialized");
    Ok(log_path)
}

/// Dated log file name inside `dir`.
#[must_use]
pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("requiam.{}.log", date.format("%Y-%m-%d")))
}

/// Initialize logging for tests (with simpler output).
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}
