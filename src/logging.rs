use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Environment variable holding a filter for repopick's log only.
pub const LOG_ENV: &str = "REPOPICK_LOG";

pub const DEFAULT_FILTER: &str = "repopick=debug,warn";

/// Size bounds for the log file, in lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRotation {
    /// Rotate once the file has more lines than this.
    pub max_lines: usize,
    /// Lines kept from the end of the file after rotating.
    pub keep_lines: usize,
}

impl Default for LogRotation {
    fn default() -> Self {
        Self {
            max_lines: 1000,
            keep_lines: 750,
        }
    }
}

/// Trim the log at `path` to its last `keep_lines` lines if it has grown past
/// `max_lines`. Returns how many lines were dropped.
///
/// A missing or unreadable log is left alone.
pub fn rotate_log(path: &Path, rotation: LogRotation) -> usize {
    let Ok(content) = std::fs::read_to_string(path) else {
        return 0;
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= rotation.max_lines {
        return 0;
    }

    let dropped = lines.len() - rotation.keep_lines.min(lines.len());
    let kept = lines[dropped..].join("\n");
    if std::fs::write(path, format!("{}\n", kept)).is_err() {
        return 0;
    }
    dropped
}

/// The filter directive in effect: `REPOPICK_LOG`, then `RUST_LOG`, then the
/// default.
pub fn filter_directive(repopick_log: Option<String>, rust_log: Option<String>) -> String {
    [repopick_log, rust_log]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Set up file-based logging with tracing-subscriber.
///
/// Logs go to `~/.repopick/repopick.log`. Nothing is written to stderr so
/// list output stays clean for piping. An unparseable filter falls back to
/// the default and is reported once logging is up.
pub fn setup_logging(config: &Config) -> Result<()> {
    config
        .ensure_dirs()
        .context("Failed to create repopick base directory for logging")?;

    let dropped = rotate_log(&config.log_path(), LogRotation::default());

    let log_path = config.log_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    let directive = filter_directive(std::env::var(LOG_ENV).ok(), std::env::var("RUST_LOG").ok());
    let (env_filter, bad_directive) = match EnvFilter::try_new(&directive) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(DEFAULT_FILTER), Some((directive, e))),
    };

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    if let Some((directive, e)) = bad_directive {
        tracing::warn!(%directive, error = %e, "invalid log filter, using default");
    }
    if dropped > 0 {
        tracing::debug!(dropped, "log rotated");
    }
    tracing::debug!("Logging initialized, writing to {}", log_path.display());

    Ok(())
}
