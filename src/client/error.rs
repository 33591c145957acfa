//! Verification client error types.

use thiserror::Error;

/// Errors raised while driving a registry over HTTP.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS, timeout, or request construction failure
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status other than the expected one
    #[error("{operation}: expected HTTP {expected}, got {actual}")]
    UnexpectedStatus {
        operation: &'static str,
        expected: u16,
        actual: u16,
        body: String,
    },

    /// A creating response carried no `Location` header
    #[error("{operation}: response has no Location header")]
    MissingLocation { operation: &'static str },

    /// The `Location` header did not end in an identifier
    #[error("{operation}: no application identifier in Location '{location}'")]
    BlankIdentifier {
        operation: &'static str,
        location: String,
    },

    /// A response or fixture body could not be decoded
    #[error("{operation}: failed to decode body: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    /// An exported descriptor is not well-formed XML
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] quick_xml::Error),

    /// A response was well-formed but did not contain what was expected
    #[error("Check '{check}' failed: expected {expected}, got {actual}")]
    Mismatch {
        check: &'static str,
        expected: String,
        actual: String,
    },
}

impl ClientError {
    /// HTTP status of the response, for status mismatches.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { actual, .. } => Some(*actual),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
