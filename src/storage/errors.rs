//! Storage error types.

use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Records must be JSON objects
    #[error("Record {key} is not a JSON object (got {kind})")]
    NotAnObject { key: String, kind: &'static str },
}
