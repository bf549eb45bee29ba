//! Error types for sift.
//!
//! Parsing, compilation, and row evaluation are deliberately infallible:
//! malformed input degrades instead of erroring. Errors exist only at the
//! edges that touch the outside world.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiftError {
    /// Could not reach the database.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema introspection failed. Callers treat this as "no columns
    /// known", which forces full in-process fallback.
    #[error("Introspection error: {0}")]
    Introspection(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for sift operations.
pub type SiftResult<T> = Result<T, SiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SiftError::Introspection("table vanished".to_string());
        assert_eq!(err.to_string(), "Introspection error: table vanished");
    }
}
