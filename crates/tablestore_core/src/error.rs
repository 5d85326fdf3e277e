//! Error types for tablestore core.

use crate::keys::KeyValidationFailure;
use tablestore_client::ClientError;
use tablestore_codec::CodecError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The backing store failed a request that is not a keyed write.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Record mapping failed, including corrupt JSON columns.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A required argument is missing or blank.
    #[error("invalid argument '{parameter}': {message}")]
    InvalidArgument {
        /// The offending parameter.
        parameter: String,
        /// What is wrong with it.
        message: String,
    },

    /// The store is not configured for the requested operation.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Which configuration the operation requires.
        message: String,
    },

    /// A key failed validation.
    #[error("invalid key: {failure}")]
    InvalidKey {
        /// The first rule the key violates.
        failure: KeyValidationFailure,
    },

    /// The store rejected a keyed write or delete.
    #[error(
        "{operation} failed for {}: {} {reason}",
        describe_keys(.partition_key, .row_key.as_deref()),
        .status.map_or_else(|| "no status".to_string(), |s| format!("status {s}"))
    )]
    StoreOperation {
        /// The store operation that failed.
        operation: String,
        /// The (sanitized) partition key involved.
        partition_key: String,
        /// The (sanitized) row key, for single-row operations.
        row_key: Option<String>,
        /// The store's status code, if it responded.
        status: Option<u16>,
        /// The store's reason phrase.
        reason: String,
    },

    /// Creating the table raced with another creation attempt.
    #[error("conflict while creating table '{table}': {reason}")]
    Conflict {
        /// The table name.
        table: String,
        /// The store's reason phrase.
        reason: String,
    },

    /// A multi-partition write stopped at its first failing partition.
    #[error(
        "batch aborted at partition '{failed_partition}' after {} completed group(s), {} group(s) not attempted: {source}",
        .completed.len(),
        .not_attempted.len()
    )]
    BatchAborted {
        /// The partition whose batch failed.
        failed_partition: String,
        /// Partitions whose batches were applied, in submission order.
        completed: Vec<String>,
        /// Partitions that were never submitted.
        not_attempted: Vec<String>,
        /// Why the failing batch was rejected.
        source: Box<CoreError>,
    },
}

fn describe_keys(partition_key: &str, row_key: Option<&str>) -> String {
    match row_key {
        Some(row_key) => format!("PartitionKey '{partition_key}', RowKey '{row_key}'"),
        None => format!("PartitionKey '{partition_key}'"),
    }
}

impl CoreError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Translates a client failure of a keyed operation.
    pub fn store_operation(
        operation: impl Into<String>,
        partition_key: impl Into<String>,
        row_key: Option<&str>,
        source: &ClientError,
    ) -> Self {
        Self::StoreOperation {
            operation: operation.into(),
            partition_key: partition_key.into(),
            row_key: row_key.map(str::to_string),
            status: source.status_code(),
            reason: source.reason(),
        }
    }

    /// Returns the store status code, if the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CoreError::Client(e) => e.status_code(),
            CoreError::StoreOperation { status, .. } => *status,
            CoreError::BatchAborted { source, .. } => source.status_code(),
            _ => None,
        }
    }

    /// Returns true if the error was detected before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidArgument { .. }
                | CoreError::InvalidOperation { .. }
                | CoreError::InvalidKey { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_operation_names_keys() {
        let err = CoreError::store_operation(
            "store_single",
            "Westview",
            Some("ABC123"),
            &ClientError::status(503, "ServerBusy"),
        );
        let msg = err.to_string();
        assert!(msg.contains("store_single"));
        assert!(msg.contains("PartitionKey 'Westview'"));
        assert!(msg.contains("RowKey 'ABC123'"));
        assert!(msg.contains("status 503"));
        assert!(msg.contains("ServerBusy"));
        assert_eq!(err.status_code(), Some(503));
    }

    #[test]
    fn batch_translation_omits_row_key() {
        let err = CoreError::store_operation(
            "store_multiple_in_partition",
            "Westview",
            None,
            &ClientError::bad_request("InvalidDuplicateRow"),
        );
        assert!(!err.to_string().contains("RowKey"));
    }

    #[test]
    fn local_errors() {
        assert!(CoreError::invalid_argument("row_key", "blank").is_local());
        assert!(CoreError::invalid_operation("selectors").is_local());
        assert!(!CoreError::from(ClientError::Transport("reset".into())).is_local());
    }

    #[test]
    fn batch_aborted_reports_progress() {
        let err = CoreError::BatchAborted {
            failed_partition: "b".into(),
            completed: vec!["a".into()],
            not_attempted: vec!["c".into(), "d".into()],
            source: Box::new(CoreError::from(ClientError::status(500, "InternalError"))),
        };
        let msg = err.to_string();
        assert!(msg.contains("'b'"));
        assert!(msg.contains("1 completed"));
        assert!(msg.contains("2 group(s) not attempted"));
        assert_eq!(err.status_code(), Some(500));
    }
}
