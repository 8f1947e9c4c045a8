//! Logging infrastructure for gisting.
//!
//! Structured logging via the `tracing` ecosystem. The terminal UI owns the
//! screen, so the default setup writes JSON lines to a rolling file under the
//! config directory and keeps stderr quiet.
//!
//! ## Example
//!
//! ```no_run
//! use gisting_core::logging;
//!
//! let _guard = logging::init_logging(None, false, false).expect("logging init");
//!
//! tracing::info!("gisting started");
//! tracing::debug!(gist_id = "aa5a315d61ae9438b18d", "reconciling gist");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::default_config_dir;
use crate::error::{GistingError, Result};

/// Name of the rolling log file inside the log directory.
pub const LOG_FILE_NAME: &str = "gisting.log";

/// Guard that must be held to ensure log flushing on shutdown.
///
/// Keep this guard alive for the lifetime of the application.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the gisting logging system.
///
/// This sets up:
/// - File logging to `<log_dir>/gisting.log` (JSON lines, rotated daily)
/// - Console logging to stderr when `console` is true (compact format)
///
/// # Arguments
///
/// * `log_dir` - Optional custom log directory. Defaults to `<config dir>/logs/`
/// * `verbose` - If true, sets log level to DEBUG. Otherwise uses INFO.
/// * `console` - Also log to stderr. Leave off while the TUI is running.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool, console: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| GistingError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = env_filter(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);

    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_file(verbose)
            .with_line_number(verbose)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| GistingError::LoggingInit {
            message: e.to_string(),
        })?;

    tracing::debug!(log_dir = %log_dir.display(), verbose, console, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// `RUST_LOG` when set, otherwise `gisting` at info (debug when verbose).
fn env_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("gisting={default_level}")))
}

/// Initialize minimal console-only logging for testing.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Get the default log directory path.
///
/// Returns `<config dir>/logs/`
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(default_config_dir()?.join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Run `f` with `RUST_LOG` set to `value` (or unset), restoring it afterwards.
    fn with_rust_log(value: Option<&str>, f: impl FnOnce()) {
        let saved = std::env::var_os("RUST_LOG");
        // SAFETY: callers are #[serial], so no other test touches the environment
        unsafe {
            match value {
                Some(v) => std::env::set_var("RUST_LOG", v),
                None => std::env::remove_var("RUST_LOG"),
            }
        }
        f();
        unsafe {
            match saved {
                Some(v) => std::env::set_var("RUST_LOG", v),
                None => std::env::remove_var("RUST_LOG"),
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_filter_follows_verbosity() {
        with_rust_log(None, || {
            assert_eq!(env_filter(false).to_string(), "gisting=info");
            assert_eq!(env_filter(true).to_string(), "gisting=debug");
        });
    }

    #[test]
    #[serial]
    fn test_rust_log_overrides_default_filter() {
        with_rust_log(Some("warn"), || {
            assert_eq!(env_filter(true).to_string(), "warn");
        });
    }

    #[test]
    fn test_init_test_logging() {
        init_test_logging();
        // A second call must be harmless
        init_test_logging();
    }

    #[test]
    fn test_default_log_dir_is_under_config_dir() {
        if let (Ok(log_dir), Ok(config_dir)) = (default_log_dir(), default_config_dir()) {
            assert_eq!(log_dir, config_dir.join("logs"));
        }
    }
}
