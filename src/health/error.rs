//! Error types for worker probing.

use thiserror::Error;

/// Errors a single probe strategy can run into.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// Request timeout
    #[error("request timeout after {0}s")]
    Timeout(u64),

    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Base URL missing or unparseable
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Response body could not be read
    #[error("invalid response: {0}")]
    ParseError(String),
}

impl ProbeError {
    /// Classify a reqwest error.
    pub fn from_reqwest(e: reqwest::Error, timeout_seconds: u64) -> Self {
        if e.is_timeout() {
            ProbeError::Timeout(timeout_seconds)
        } else {
            // DNS, TLS and refused connections all land here
            ProbeError::ConnectionFailed(e.to_string())
        }
    }
}
