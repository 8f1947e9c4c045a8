//! Error types for gisting startup and configuration.
//!
//! [`GistingError`] covers everything that can go wrong before the session
//! starts: locating and parsing the config file, creating directories and
//! initializing logging. Storage, remote and sync errors live in their own
//! crates.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`GistingError`].
pub type Result<T> = std::result::Result<T, GistingError>;

/// Error type for configuration, I/O and logging setup.
#[derive(Debug, Error)]
pub enum GistingError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// No per-user config directory could be determined
    #[error("Could not determine the user config directory")]
    ConfigDirUnavailable,

    /// Configuration file is not valid JSON
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON error in {context}: {message}")]
    Json {
        context: String,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // =========================================================================
    // Logging Errors
    // =========================================================================
    /// The tracing subscriber could not be installed
    #[error("Failed to initialize logging: {message}")]
    LoggingInit { message: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in gisting)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GistingError {
    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a JSON error
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a ConfigInvalid error from a parse failure
    pub fn config_invalid(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::ConfigInvalid {
            path: path.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigDirUnavailable | Self::ConfigInvalid { .. }
        )
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigDirUnavailable => Some("Pass --config-dir to choose a config location"),
            Self::ConfigInvalid { .. } => {
                Some("Fix or delete config.json; a fresh one is created on next start")
            }
            Self::DirectoryCreation { .. } => Some("Check permissions on the config directory"),
            _ => None,
        }
    }
}
