//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while mapping records to entities and back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A JSON fallback column holds something other than text.
    ///
    /// The stored data does not match the record's schema and cannot be
    /// recovered by skipping the column.
    #[error("column '{column}' is expected to hold JSON text but holds a value of kind {found}")]
    CorruptJsonColumn {
        /// The marker-prefixed column name.
        column: String,
        /// The native kind that was found instead.
        found: String,
    },

    /// The JSON text in a fallback column could not be deserialized.
    #[error("column '{column}' holds JSON that does not match the field type: {message}")]
    Json {
        /// The marker-prefixed column name.
        column: String,
        /// Description of the deserialization error.
        message: String,
    },

    /// A field value could not be serialized to JSON.
    #[error("failed to encode field '{column}' as JSON: {message}")]
    EncodingFailed {
        /// The field's column name.
        column: String,
        /// Description of the serialization error.
        message: String,
    },
}

impl CodecError {
    /// Create a corrupt JSON column error.
    pub fn corrupt_json_column(column: impl Into<String>, found: impl Into<String>) -> Self {
        Self::CorruptJsonColumn {
            column: column.into(),
            found: found.into(),
        }
    }

    /// Create a JSON deserialization error.
    pub fn json(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Json {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an encoding failed error.
    pub fn encoding_failed(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Returns true if the error means the stored data is corrupt.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::CorruptJsonColumn { .. })
    }
}
