//! Error types for the configuration store.

use thiserror::Error;

/// Errors that can occur talking to the configuration store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Credentials or namespace missing
    #[error("KV store not configured: {0}")]
    NotConfigured(String),

    /// Connection, DNS or TLS failure
    #[error("KV transport error: {0}")]
    Transport(String),

    /// Request timeout
    #[error("KV request timeout after {0}s")]
    Timeout(u64),

    /// Store answered with an unexpected status
    #[error("KV store rejected request with HTTP {status}: {body}")]
    RemoteRejected { status: u16, body: String },

    /// Stored value is not valid JSON
    #[error("invalid KV payload: {0}")]
    InvalidPayload(String),
}

impl StoreError {
    /// Convert a reqwest error into a store error.
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_seconds: u64) -> Self {
        if e.is_timeout() {
            StoreError::Timeout(timeout_seconds)
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}
