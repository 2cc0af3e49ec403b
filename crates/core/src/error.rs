//! Error types for the trade calendar system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the trade calendar system.
///
/// Only failures that callers must act on are represented here. Decode
/// ambiguity, unknown schemas and malformed rows degrade to "no data"
/// inside the ingestion pipeline and never surface as errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (e.g. a CSV path outside the project root).
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether this error is a configuration error.
    ///
    /// Configuration errors are fatal and never cached by the aggregator.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::config("path escapes root");
        assert!(err.is_config());
        assert_eq!(err.to_string(), "Configuration error: path escapes root");
    }

    #[test]
    fn test_io_error_is_not_config() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(!err.is_config());
        assert!(err.to_string().starts_with("I/O error"));
    }
}
