//! Opt-in `tracing-subscriber` setup for hosts and this crate's own
//! integration tests (SPEC_FULL §7.1). Library code itself never installs
//! a global subscriber — only `tracing::*` macro calls appear throughout
//! `parser`, `teletype`, `io_loop`, and `keymap` — so an embedding host
//! keeps control of its own subscriber; calling [`init`] is purely
//! opt-in convenience.
//!
//! Grounded on the teacher's `core/log/tracing_init.rs` (layer
//! construction) and `rolling_file_appender_impl.rs` (a fallible
//! rolling-file-appender constructor reported through `miette`/
//! `thiserror`), collapsed from the teacher's OpenTelemetry-ready
//! multi-layer builder down to this crate's two-layer stdout+file case.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::LoggingError;

/// Holds the rolling-file appender's worker thread alive. Drop this only
/// once the host is done logging — dropping it early stops flushing
/// buffered lines to disk.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install a global `tracing` subscriber: an ANSI stdout layer, plus (if
/// `log_dir` is given) a daily-rolling file layer, both filtered by
/// `RUST_LOG` when set, else `default_level`.
///
/// If a subscriber is already installed (e.g. a second call from a test
/// binary), this is a no-op rather than a panic.
pub fn init(log_dir: Option<&Path>, default_level: &str) -> Result<LoggingGuard, LoggingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stdout_layer = fmt::layer().with_ansi(true).with_target(false);

    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(dir, "teletype-core.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_target(false).with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init();

    Ok(LoggingGuard { _file_guard: file_guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_without_file_layer_succeeds() {
        assert!(init(None, "info").is_ok());
    }

    #[test]
    fn init_with_file_layer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        assert!(init(Some(&log_dir), "debug").is_ok());
        assert!(log_dir.exists());
    }
}
