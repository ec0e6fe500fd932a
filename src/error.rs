//! Error types for the relay
//!
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Connection-scoped errors (IO, oversized line) terminate a single
/// session; startup errors terminate the process.
#[derive(Debug, Error)]
pub enum RelayError {
    /// IO error (connection-fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No newline found within the read buffer cap
    #[error("line exceeds {limit} bytes without a newline")]
    LineTooLong { limit: usize },

    /// Startup argument is not a valid port number
    #[error("invalid port: {0}")]
    InvalidPort(String),
}
