//! Error types for configuration sync.

use crate::kv::StoreError;
use thiserror::Error;

/// Errors returned by [`super::ConfigSync`] operations.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// Store credentials are missing
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Network failure or timeout talking to the store
    #[error("transport error: {0}")]
    Transport(String),

    /// Store refused the request
    #[error("remote store rejected the request (HTTP {status}): {body}")]
    RemoteRejected { status: u16, body: String },

    /// Caller input that cannot be saved even with fallbacks
    #[error("invalid {field}: {message}")]
    ValidationFailed { field: String, message: String },

    /// Stored blob exists but cannot be decoded
    #[error("stored configuration is unreadable: {0}")]
    Corrupt(String),
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotConfigured(msg) => SyncError::NotConfigured(msg),
            StoreError::Transport(msg) => SyncError::Transport(msg),
            StoreError::Timeout(_) => SyncError::Transport(e.to_string()),
            StoreError::RemoteRejected { status, body } => {
                SyncError::RemoteRejected { status, body }
            }
            StoreError::InvalidPayload(msg) => SyncError::Corrupt(msg),
        }
    }
}
