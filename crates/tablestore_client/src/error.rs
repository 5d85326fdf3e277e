//! Error types for table service clients.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// HTTP status the store uses for malformed requests.
pub const STATUS_BAD_REQUEST: u16 = 400;
/// HTTP status the store uses for missing tables or rows.
pub const STATUS_NOT_FOUND: u16 = 404;
/// HTTP status the store uses for conflicting writes and creation races.
pub const STATUS_CONFLICT: u16 = 409;

/// Errors reported by a table service client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The store answered with an error status.
    #[error("store responded with status {status}: {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Reason phrase or error code returned by the store.
        reason: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The supplied credentials are unusable.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
}

impl ClientError {
    /// Creates a status error.
    pub fn status(status: u16, reason: impl Into<String>) -> Self {
        Self::Status {
            status,
            reason: reason.into(),
        }
    }

    /// Creates a bad request error.
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::status(STATUS_BAD_REQUEST, reason)
    }

    /// Creates a not found error.
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::status(STATUS_NOT_FOUND, reason)
    }

    /// Creates a conflict error.
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::status(STATUS_CONFLICT, reason)
    }

    /// Returns the status code, if the store responded.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the reason phrase, or the error text for non-status errors.
    pub fn reason(&self) -> String {
        match self {
            ClientError::Status { reason, .. } => reason.clone(),
            ClientError::Transport(message) | ClientError::InvalidCredentials(message) => {
                message.clone()
            }
        }
    }

    /// Returns true for a conflict-class failure.
    pub fn is_conflict(&self) -> bool {
        self.status_code() == Some(STATUS_CONFLICT)
    }

    /// Returns true if the table or row does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(STATUS_NOT_FOUND)
    }
}
