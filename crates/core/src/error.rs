//! Unified error types for crawlhtml.
//!
//! Every failure is returned to the immediate caller. Nothing in the fetch or
//! charset pipeline logs and swallows an error, and nothing is retried.

use std::sync::Arc;

use crate::config::ConfigError;

/// Boxed cause carried by transport failures.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Unified error type for the fetch and charset pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The GET request could not be built or sent.
    #[error("FETCH_FAILED: {0}")]
    Fetch(#[from] FetchError),

    /// The charset detector produced no best guess.
    #[error("DETECTION_FAILED: {0}")]
    Detection(#[from] DetectionError),

    /// Detection succeeded but the charset has no registered decoder.
    #[error("UNSUPPORTED_CHARSET: not supported charset = [{0}]")]
    UnsupportedCharset(String),

    /// A request header name or value was rejected.
    #[error("INVALID_HEADER: {0}")]
    InvalidHeader(String),

    /// Transcoded output could not be read back.
    #[error("DECODE_FAILED: {0}")]
    Decode(String),

    /// Configuration could not be loaded or failed validation.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),
}

/// Transport-level failures during the GET request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The URL is not an absolute http(s) URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// DNS, connect, TLS or body read failure from the underlying transport.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The transport gave up waiting.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// The response body exceeded the configured limit.
    #[error("response too large: {size} bytes exceeds {limit}")]
    TooLarge { size: u64, limit: usize },
}

impl FetchError {
    /// Wrap an arbitrary transport cause.
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FetchError::Transport(Arc::new(err))
    }
}

/// Failures of the charset detection oracle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectionError {
    /// There are no bytes to inspect.
    #[error("empty input")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_unsupported_charset_message_carries_label() {
        let err = Error::UnsupportedCharset("ISO-8859-1".to_string());
        assert!(err.to_string().contains("UNSUPPORTED_CHARSET"));
        assert!(err.to_string().contains("[ISO-8859-1]"));
    }

    #[test]
    fn test_fetch_error_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = FetchError::transport(io);
        assert!(err.to_string().contains("connection refused"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_from_fetch_error() {
        let err: Error = FetchError::InvalidUrl("nope".to_string()).into();
        assert!(matches!(err, Error::Fetch(FetchError::InvalidUrl(_))));
        assert!(err.to_string().starts_with("FETCH_FAILED"));
    }

    #[test]
    fn test_detection_error_display() {
        let err: Error = DetectionError::Empty.into();
        assert_eq!(err.to_string(), "DETECTION_FAILED: empty input");
    }

    #[test]
    fn test_error_from_config_error() {
        let err: Error = ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() }.into();
        assert!(err.to_string().starts_with("CONFIG_ERROR: invalid configuration: max_bytes"));
    }

    #[test]
    fn test_too_large_display() {
        let err = FetchError::TooLarge { size: 11, limit: 10 };
        assert_eq!(err.to_string(), "response too large: 11 bytes exceeds 10");
    }
}
