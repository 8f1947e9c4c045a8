//! Error types for the terminal UI.

use thiserror::Error;

/// Errors that end the UI session.
#[derive(Debug, Error)]
pub enum TuiError {
    /// Terminal setup, drawing or input failed
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// The sync worker thread or its runtime could not be started
    #[error("failed to start sync worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// The sync worker stopped while the UI still needed it
    #[error("sync worker stopped unexpectedly")]
    WorkerGone,
}

/// Result type for app operations.
pub type AppResult<T> = std::result::Result<T, TuiError>;
