//! Error types for the local store.

use thiserror::Error;

/// Local store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (creating the store directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store has been closed
    #[error("store is closed")]
    Closed,

    /// A record did not serialize to a JSON object
    #[error("invalid {collection} record: {message}")]
    InvalidRecord {
        /// Collection the record was destined for
        collection: &'static str,
        /// Human-readable message
        message: String,
    },

    /// A filter value that cannot be compared in SQL
    #[error("unsupported filter value for field '{field}'")]
    UnsupportedFilter {
        /// Field the filter applies to
        field: String,
    },

    /// The connection mutex was poisoned by a panicking thread
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Check if this error indicates a database lock.
    pub fn is_database_locked(&self) -> bool {
        match self {
            StoreError::Database(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
            }
            _ => false,
        }
    }

    /// Create a user-friendly message for this error.
    pub fn friendly_message(&self) -> String {
        match self {
            StoreError::Closed => "Local store is closed.".to_string(),
            StoreError::Database(e) => {
                let msg = e.to_string().to_lowercase();
                if msg.contains("locked") || msg.contains("busy") {
                    "Local store is temporarily locked. Please try again.".to_string()
                } else {
                    format!("Local store error: {}", e)
                }
            }
            StoreError::Io(e) => {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    "Permission denied. Check permissions on the config directory.".to_string()
                } else {
                    format!("File system error: {}", e)
                }
            }
            _ => format!("Error: {}", self),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
