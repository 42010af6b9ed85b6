//! Remote configuration store module.
//!
//! The remote KV namespace is the system of record for worker configuration.
//! [`KvClient`] reads and writes opaque JSON blobs by key over authenticated
//! HTTPS and fronts reads with a short-TTL [`LocalCache`].

mod cache;
mod error;
mod memory;

pub use cache::*;
pub use error::*;
pub use memory::MemoryStore;

use crate::config::KvConfig;
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Schema version stamped on every object written.
pub const SCHEMA_VERSION: u64 = 1;

/// Logical key of the AI model mapping.
pub const MODEL_CONFIG_KEY: &str = "ai_model_config";

/// Logical key of the global settings blob.
pub const GLOBAL_SETTINGS_KEY: &str = "global_settings";

/// Logical key of a worker's rate-limit settings.
pub fn worker_config_key(worker_id: &str) -> String {
    format!("worker_config_{worker_id}")
}

/// Storage of JSON configuration blobs keyed by logical name.
#[async_trait]
pub trait ConfigurationStore: Send + Sync + 'static {
    /// Read a value. `Ok(None)` means the key does not exist.
    ///
    /// With `force_refresh` any cached copy is ignored.
    async fn get(&self, key: &str, force_refresh: bool) -> Result<Option<Value>, StoreError>;

    /// Write a value, replacing whatever was stored.
    async fn put(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Delete a value. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Whether credentials are present. Calls fail with
    /// [`StoreError::NotConfigured`] otherwise.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Add audit fields to object values before they are written.
pub fn stamp_audit_fields(value: &Value, updated_by: &str) -> Value {
    let mut stamped = value.clone();
    if let Value::Object(map) = &mut stamped {
        map.insert("updated_by".to_string(), Value::from(updated_by));
        map.insert(
            "updated_at".to_string(),
            Value::from(chrono::Utc::now().to_rfc3339()),
        );
        map.insert("version".to_string(), Value::from(SCHEMA_VERSION));
    }
    stamped
}

/// Credentials resolved from [`KvConfig`].
struct Credentials {
    account_id: String,
    namespace_id: String,
    token: String,
}

/// REST client for the remote KV namespace.
pub struct KvClient {
    client: reqwest::Client,
    config: KvConfig,
    token: Option<String>,
    cache: LocalCache,
}

impl KvClient {
    /// Create a client from configuration. Missing credentials are only
    /// reported when a request is made.
    pub fn new(config: KvConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self::with_client(config, client))
    }

    /// Create a client with a custom HTTP client (for testing).
    pub fn with_client(config: KvConfig, client: reqwest::Client) -> Self {
        let token = config.resolve_token();
        let cache = LocalCache::new(config.cache_ttl_seconds);
        Self {
            client,
            config,
            token,
            cache,
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    fn credentials(&self) -> Result<Credentials, StoreError> {
        let account_id = self.config.account_id.trim();
        if account_id.is_empty() {
            return Err(StoreError::NotConfigured("account_id is not set".to_string()));
        }
        let namespace_id = self.config.namespace_id.trim();
        if namespace_id.is_empty() {
            return Err(StoreError::NotConfigured(
                "namespace_id is not set".to_string(),
            ));
        }
        let token = self
            .token
            .clone()
            .ok_or_else(|| StoreError::NotConfigured("API token is not set".to_string()))?;
        Ok(Credentials {
            account_id: account_id.to_string(),
            namespace_id: namespace_id.to_string(),
            token,
        })
    }

    fn namespace_url(&self, creds: &Credentials) -> String {
        format!(
            "{}/accounts/{}/storage/kv/namespaces/{}",
            self.config.api_base.trim_end_matches('/'),
            creds.account_id,
            creds.namespace_id
        )
    }

    /// The key is pushed as one path segment so `/`, `?` and `#` stay
    /// inside it.
    fn value_url(&self, creds: &Credentials, key: &str) -> Result<reqwest::Url, StoreError> {
        let mut url = reqwest::Url::parse(&self.namespace_url(creds))
            .map_err(|e| StoreError::NotConfigured(format!("invalid api_base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::NotConfigured("api_base cannot be a base URL".to_string()))?
            .push("values")
            .push(key);
        Ok(url)
    }

    /// Check that the credentials can see the namespace.
    pub async fn verify(&self) -> Result<(), StoreError> {
        let creds = self.credentials()?;
        let timeout = self.config.read_timeout_seconds;
        let response = self
            .client
            .get(self.namespace_url(&creds))
            .bearer_auth(&creds.token)
            .timeout(Duration::from_secs(timeout))
            .send()
            .await
            .map_err(|e| StoreError::from_reqwest(e, timeout))?;

        let status = response.status();
        record_request("verify", status.as_u16());
        if status.is_success() {
            tracing::debug!("KV namespace reachable");
            Ok(())
        } else {
            Err(rejected(response).await)
        }
    }

    async fn fetch(&self, creds: &Credentials, key: &str) -> Result<Option<Value>, StoreError> {
        let timeout = self.config.read_timeout_seconds;
        let start = Instant::now();
        let response = self
            .client
            .get(self.value_url(creds, key)?)
            .bearer_auth(&creds.token)
            .timeout(Duration::from_secs(timeout))
            .send()
            .await
            .map_err(|e| StoreError::from_reqwest(e, timeout))?;

        let status = response.status();
        record_request("get", status.as_u16());
        tracing::debug!(
            key,
            http_code = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "KV read"
        );

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(rejected(response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| StoreError::from_reqwest(e, timeout))?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| StoreError::InvalidPayload(format!("{key}: {e}")))
    }
}

#[async_trait]
impl ConfigurationStore for KvClient {
    async fn get(&self, key: &str, force_refresh: bool) -> Result<Option<Value>, StoreError> {
        let creds = self.credentials()?;

        if !force_refresh {
            if let Some(value) = self.cache.get(key) {
                tracing::trace!(key, "KV cache hit");
                return Ok(Some(value));
            }
        }

        // A put or delete that lands while the fetch is in flight bumps the
        // generation, and the fetched value is then not cached.
        let generation = self.cache.generation(key);
        let value = self.fetch(&creds, key).await?;
        match &value {
            Some(v) => {
                if !self.cache.insert_if_generation(key, v.clone(), generation) {
                    tracing::trace!(key, "KV value changed during read, not cached");
                }
            }
            None => {
                self.cache.invalidate(key);
            }
        }
        Ok(value)
    }

    async fn put(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let creds = self.credentials()?;
        let timeout = self.config.write_timeout_seconds;
        let body = stamp_audit_fields(value, &self.config.updated_by);

        let response = self
            .client
            .put(self.value_url(&creds, key)?)
            .bearer_auth(&creds.token)
            .timeout(Duration::from_secs(timeout))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::from_reqwest(e, timeout))?;

        let status = response.status();
        record_request("put", status.as_u16());
        if !status.is_success() {
            tracing::warn!(key, http_code = status.as_u16(), "KV write rejected");
            return Err(rejected(response).await);
        }

        self.cache.invalidate(key);
        tracing::info!(key, "KV value written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let creds = self.credentials()?;
        let timeout = self.config.write_timeout_seconds;

        let response = self
            .client
            .delete(self.value_url(&creds, key)?)
            .bearer_auth(&creds.token)
            .timeout(Duration::from_secs(timeout))
            .send()
            .await
            .map_err(|e| StoreError::from_reqwest(e, timeout))?;

        let status = response.status();
        record_request("delete", status.as_u16());
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(rejected(response).await);
        }

        self.cache.invalidate(key);
        tracing::info!(key, "KV value deleted");
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }
}

fn record_request(operation: &'static str, status: u16) {
    metrics::counter!("faqsync_kv_requests_total",
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);
}

async fn rejected(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StoreError::RemoteRejected { status, body }
}
