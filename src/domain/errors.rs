//! Domain error types
//!
//! This module defines the error hierarchy for the exporter. Errors raised by
//! the upstream data source are kept apart from run-level failures so the
//! fetcher can tell a retryable condition from a fatal one.

use crate::domain::data_type::DataType;
use thiserror::Error;

/// Main exporter error type
///
/// Every fatal condition of a run ends up here. Normal outcomes such as an
/// empty window or an empty-run stop are never represented as errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors raised by the upstream data source
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Retries for a single window ran out
    #[error("Fetch exhausted for {data_type} after {attempts} attempts ({window}): {last_error}")]
    FetchExhausted {
        data_type: DataType,
        window: String,
        attempts: u32,
        last_error: SourceError,
    },

    /// Validation errors on run input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Artifact verification failed
    #[error("Verification error: {0}")]
    Verification(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ExportError {
    /// Whether this error came from running out of retries
    pub fn is_fetch_exhausted(&self) -> bool {
        matches!(self, ExportError::FetchExhausted { .. })
    }
}

/// Upstream data source errors
///
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Non-success HTTP status
    #[error("Unexpected status {status}: {message}")]
    TransientHttp { status: u16, message: String },

    /// Connection or transport failure
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// TLS handshake failed
    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    /// Body is not parseable JSON, or has the wrong shape for the endpoint
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Source did not answer the reachability probe with 200
    #[error("Source unreachable at {url} (status {status})")]
    Unreachable { url: String, status: u16 },

    /// Base URL could not be parsed
    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),
}

impl SourceError {
    /// Whether the fetcher may retry the same window after this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::TransientHttp { .. }
                | SourceError::Transport(_)
                | SourceError::Timeout(_)
                | SourceError::TlsHandshake(_)
        )
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ExportError {
    fn from(err: toml::de::Error) -> Self {
        ExportError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_error_display() {
        let err = ExportError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_source_error_conversion() {
        let source_err = SourceError::Transport("connection reset".to_string());
        let err: ExportError = source_err.into();
        assert!(matches!(err, ExportError::Source(_)));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(SourceError::TransientHttp {
            status: 502,
            message: "bad gateway".to_string()
        }
        .is_retryable());
        assert!(SourceError::Timeout("60s".to_string()).is_retryable());
        assert!(SourceError::Transport("reset".to_string()).is_retryable());
        assert!(!SourceError::MalformedResponse("eof".to_string()).is_retryable());
        assert!(!SourceError::InvalidUrl("::".to_string()).is_retryable());
    }

    #[test]
    fn test_fetch_exhausted_display() {
        let err = ExportError::FetchExhausted {
            data_type: DataType::Entries,
            window: "1..2".to_string(),
            attempts: 4,
            last_error: SourceError::TransientHttp {
                status: 500,
                message: String::new(),
            },
        };
        assert!(err.is_fetch_exhausted());
        assert!(err.to_string().contains("entries"));
        assert!(err.to_string().contains("4 attempts"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: ExportError = io_err.into();
        assert!(matches!(err, ExportError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ExportError = json_err.into();
        assert!(matches!(err, ExportError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: ExportError = toml_err.into();
        assert!(matches!(err, ExportError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
