//! Configuration module for faqsync
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`FAQSYNC_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use faqsync::config::SyncConfig;
//!
//! let config = SyncConfig::default();
//! assert_eq!(config.kv.cache_ttl_seconds, 300);
//!
//! let toml = r#"
//! [kv]
//! account_id = "acc"
//! "#;
//! let config: SyncConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.kv.account_id, "acc");
//! ```

pub mod cascade;
pub mod error;
pub mod kv;
pub mod logging;
pub mod worker;

pub use cascade::CascadeConfig;
pub use error::ConfigError;
pub use kv::KvConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use worker::WorkerConfig;

// Re-export ProbeConfig from health module
pub use crate::health::ProbeConfig;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Unified configuration for the sync engine.
///
/// Aggregates the remote store, probing, cascade, worker list and logging.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Remote KV store connection and cache settings
    pub kv: KvConfig,
    /// Worker probe settings
    pub probe: ProbeConfig,
    /// Cache-clear cascade settings
    pub cascade: CascadeConfig,
    /// Worker definitions
    pub workers: Vec<WorkerConfig>,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl SyncConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse {
                    path: p.to_path_buf(),
                    message: e.to_string(),
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(account) = std::env::var("FAQSYNC_KV_ACCOUNT_ID") {
            self.kv.account_id = account;
        }
        if let Ok(namespace) = std::env::var("FAQSYNC_KV_NAMESPACE_ID") {
            self.kv.namespace_id = namespace;
        }
        if let Ok(token) = std::env::var("FAQSYNC_KV_API_TOKEN") {
            if !token.is_empty() {
                self.kv.api_token = Some(token);
            }
        }
        if let Ok(updated_by) = std::env::var("FAQSYNC_UPDATED_BY") {
            self.kv.updated_by = updated_by;
        }

        if let Ok(level) = std::env::var("FAQSYNC_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("FAQSYNC_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(stagger) = std::env::var("FAQSYNC_PROBE_STAGGER_MS") {
            if let Ok(ms) = stagger.parse() {
                self.probe.stagger_ms = ms;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kv.cache_ttl_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "kv.cache_ttl_seconds".to_string(),
                message: "cache TTL must be non-zero".to_string(),
            });
        }

        let timeouts = [
            ("kv.read_timeout_seconds", self.kv.read_timeout_seconds),
            ("kv.write_timeout_seconds", self.kv.write_timeout_seconds),
            ("probe.timeout_seconds", self.probe.timeout_seconds),
            ("cascade.timeout_seconds", self.cascade.timeout_seconds),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.to_string(),
                    message: "timeout must be non-zero".to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for (i, worker) in self.workers.iter().enumerate() {
            if worker.id.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("workers[{}].id", i),
                    message: "id cannot be empty".to_string(),
                });
            }
            if !seen.insert(worker.id.as_str()) {
                return Err(ConfigError::Validation {
                    field: format!("workers[{}].id", i),
                    message: format!("duplicate worker id '{}'", worker.id),
                });
            }
            if !worker.url.is_empty() && reqwest::Url::parse(&worker.url).is_err() {
                return Err(ConfigError::Validation {
                    field: format!("workers[{}].url", i),
                    message: format!("'{}' is not a valid URL", worker.url),
                });
            }
        }

        Ok(())
    }
}
