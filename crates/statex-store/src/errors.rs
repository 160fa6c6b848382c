//! Error handling for statex-store
//!
//! Wraps statex-core ExError with store-specific helpers

use statex_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a document validation error
pub fn document_validation(key: &str, reason: &str) -> ExError {
    let error = ExError::new(ExErrorKind::InvalidInput)
        .with_op("document_parse")
        .with_message(reason.to_string());
    if key.is_empty() {
        error
    } else {
        error.with_key(key)
    }
}

/// Create a snapshot encoding or decoding error
pub fn snapshot_format(path: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("snapshot_codec")
        .with_message(format!("Snapshot {} is not valid: {}", path, err))
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
