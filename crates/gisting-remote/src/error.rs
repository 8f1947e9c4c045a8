//! Error types for the remote gist client.

use thiserror::Error;

/// Remote client errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The API answered with a non-success status
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The token was rejected
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// No token is available at all
    #[error("Not logged in: no GitHub access token")]
    Unauthenticated,

    /// Network timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Any other HTTP transport error
    #[error("HTTP error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body was not what the API promises
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout(e.to_string())
        } else if e.is_connect() {
            RemoteError::Connection(e.to_string())
        } else if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Transport(e)
        }
    }
}

impl RemoteError {
    /// Check if this error is a transport failure rather than an API answer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RemoteError::Timeout(_) | RemoteError::Connection(_) | RemoteError::Transport(_)
        )
    }

    /// Check if the user needs to (re)authenticate.
    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::Unauthorized(_) | RemoteError::Unauthenticated)
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Api { status, .. } => Some(*status),
            RemoteError::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    /// Get a user-friendly error message.
    ///
    /// API messages are shown verbatim; transport failures collapse to a
    /// generic connectivity message.
    pub fn friendly_message(&self) -> String {
        match self {
            RemoteError::Api { message, .. } => message.clone(),
            RemoteError::Unauthorized(_) => {
                "GitHub rejected the access token. Run `gisting logout` and sign in again."
                    .to_string()
            }
            RemoteError::Unauthenticated => {
                "No GitHub token. Pass --token or set GITHUB_TOKEN.".to_string()
            }
            RemoteError::Timeout(_) | RemoteError::Connection(_) | RemoteError::Transport(_) => {
                "Could not reach GitHub. Check your network connection.".to_string()
            }
            RemoteError::Decode(_) => "GitHub sent an unexpected response.".to_string(),
            RemoteError::Config(msg) => format!("Configuration error: {}", msg),
        }
    }
}

/// Result type for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_message_is_verbatim() {
        let err = RemoteError::Api {
            status: 422,
            message: "Validation Failed".to_string(),
        };
        assert_eq!(err.friendly_message(), "Validation Failed");
        assert_eq!(err.status(), Some(422));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_transport_errors_are_generic() {
        let timeout = RemoteError::Timeout("operation timed out".to_string());
        let refused = RemoteError::Connection("connection refused".to_string());
        assert!(timeout.is_transport());
        assert!(refused.is_transport());
        assert_eq!(timeout.friendly_message(), refused.friendly_message());
    }

    #[test]
    fn test_auth_errors() {
        assert!(RemoteError::Unauthenticated.is_auth());
        assert!(RemoteError::Unauthorized("Bad credentials".to_string()).is_auth());
        assert_eq!(
            RemoteError::Unauthorized("Bad credentials".to_string()).status(),
            Some(401)
        );
    }
}
