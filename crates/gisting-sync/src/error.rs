//! Error taxonomy of the sync engine.
//!
//! Every engine operation returns a [`SyncError`] instead of panicking. The
//! session controller turns them into status messages; only a storage error
//! during the very first refresh ends the session.

use gisting_remote::RemoteError;
use gisting_store::StoreError;
use thiserror::Error;

/// Coarse classification of a [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Storage,
    Remote,
    Network,
    Validation,
    Consistency,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Storage => write!(f, "storage"),
            ErrorKind::Remote => write!(f, "remote"),
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Consistency => write!(f, "consistency"),
        }
    }
}

/// Sync engine errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local store unavailable or a write failed
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// The API rejected the call
    #[error("remote error: {0}")]
    Remote(#[source] RemoteError),

    /// The API or a raw URL could not be reached
    #[error("network error: {0}")]
    Network(#[source] RemoteError),

    /// Bad input, caught before any I/O
    #[error("{message}")]
    Validation { message: String },

    /// An invariant did not hold; the operation was abandoned
    #[error("consistency error: {message}")]
    Consistency { message: String },
}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        if e.is_transport() {
            SyncError::Network(e)
        } else {
            SyncError::Remote(e)
        }
    }
}

impl SyncError {
    pub fn validation(message: impl Into<String>) -> Self {
        SyncError::Validation {
            message: message.into(),
        }
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        SyncError::Consistency {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Storage(_) => ErrorKind::Storage,
            SyncError::Remote(_) => ErrorKind::Remote,
            SyncError::Network(_) => ErrorKind::Network,
            SyncError::Validation { .. } => ErrorKind::Validation,
            SyncError::Consistency { .. } => ErrorKind::Consistency,
        }
    }

    /// Whether the session can carry on after this error.
    ///
    /// Storage errors are fatal during startup; everything else is shown and
    /// the operation abandoned.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SyncError::Storage(_))
    }

    /// Get a user-friendly error message.
    pub fn friendly_message(&self) -> String {
        match self {
            SyncError::Storage(e) => e.friendly_message(),
            SyncError::Remote(e) | SyncError::Network(e) => e.friendly_message(),
            SyncError::Validation { message } => message.clone(),
            SyncError::Consistency { message } => {
                format!("Internal error: {}. Press R to refresh.", message)
            }
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
