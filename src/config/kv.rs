//! Remote KV store configuration

use serde::{Deserialize, Serialize};

/// Default REST base for the KV backend.
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Connection and caching settings for the remote configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KvConfig {
    /// REST API base URL (no trailing slash)
    pub api_base: String,
    /// Account identifier embedded in the request path
    pub account_id: String,
    /// KV namespace holding worker configuration
    pub namespace_id: String,
    /// Bearer token given inline (prefer `api_token_env`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Name of the environment variable holding the bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token_env: Option<String>,
    /// Identity recorded in the `updated_by` audit field
    pub updated_by: String,
    /// Lifetime of local cache entries
    pub cache_ttl_seconds: u64,
    /// Timeout for reads
    pub read_timeout_seconds: u64,
    /// Timeout for writes and deletes
    pub write_timeout_seconds: u64,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            account_id: String::new(),
            namespace_id: String::new(),
            api_token: None,
            api_token_env: None,
            updated_by: "faqsync".to_string(),
            cache_ttl_seconds: 300,
            read_timeout_seconds: 20,
            write_timeout_seconds: 45,
        }
    }
}

impl KvConfig {
    /// Resolve the bearer token, preferring the inline value over the env var.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(token) = self.api_token.as_ref().filter(|t| !t.is_empty()) {
            return Some(token.clone());
        }
        self.api_token_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|t| !t.is_empty())
    }
}
