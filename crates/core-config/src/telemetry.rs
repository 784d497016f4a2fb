//! File logging for the embedding host.

use anyhow::{Context, Result, anyhow};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

pub const LOG_FILE_NAME: &str = "vimput.log";

/// Install a global `fmt` subscriber writing to `<dir>/vimput.log`.
///
/// Filtering follows `RUST_LOG`. A previous log file is truncated. The returned
/// guard flushes the background writer on drop, so the host keeps it alive for
/// as long as it wants logs. Fails if a global subscriber is already set.
pub fn init_file_logging(dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    let log_path = dir.join(LOG_FILE_NAME);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(nb_writer)
        .try_init()
        .map_err(|e| anyhow!("tracing subscriber already installed: {e}"))?;
    tracing::info!(target: "config", path = %log_path.display(), "file_logging_initialized");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let first = init_file_logging(dir.path());
        assert!(first.is_ok());
        assert!(dir.path().join(LOG_FILE_NAME).exists());
        let second = init_file_logging(dir.path());
        assert!(second.is_err());
    }
}
