//! Shared test utilities for faqsync integration tests.

#![allow(dead_code)]

use faqsync::cascade::Cascade;
use faqsync::config::{CascadeConfig, KvConfig};
use faqsync::health::{ProbeConfig, Prober};
use faqsync::kv::KvClient;
use faqsync::registry::{Registry, WorkerEndpoint};
use faqsync::sync::ConfigSync;
use std::sync::Arc;

// =============================================================================
// Well-Known Test Constants
// =============================================================================

pub const ACCOUNT_ID: &str = "test-account";
pub const NAMESPACE_ID: &str = "test-namespace";
pub const API_TOKEN: &str = "test-token";

/// Path of a value in the mock KV namespace.
pub fn kv_value_path(key: &str) -> String {
    format!(
        "/accounts/{}/storage/kv/namespaces/{}/values/{}",
        ACCOUNT_ID, NAMESPACE_ID, key
    )
}

// =============================================================================
// Builders
// =============================================================================

/// KV config pointing at a mock server.
pub fn kv_config(api_base: &str) -> KvConfig {
    KvConfig {
        api_base: api_base.to_string(),
        account_id: ACCOUNT_ID.to_string(),
        namespace_id: NAMESPACE_ID.to_string(),
        api_token: Some(API_TOKEN.to_string()),
        api_token_env: None,
        cache_ttl_seconds: 300,
        read_timeout_seconds: 2,
        write_timeout_seconds: 2,
        ..KvConfig::default()
    }
}

pub fn kv_client(api_base: &str) -> KvClient {
    KvClient::with_client(kv_config(api_base), reqwest::Client::new())
}

/// Prober with short timeouts and no stagger.
pub fn fast_prober() -> Prober {
    Prober::with_client(
        ProbeConfig {
            timeout_seconds: 2,
            stagger_ms: 0,
            interval_seconds: 1,
            ..ProbeConfig::default()
        },
        reqwest::Client::new(),
    )
}

pub fn fast_cascade() -> Cascade {
    Cascade::with_client(
        CascadeConfig {
            timeout_seconds: 2,
            max_concurrency: 0,
        },
        reqwest::Client::new(),
    )
}

/// Registry holding the given `(id, base_url)` workers, all enabled.
pub fn registry_with(workers: &[(&str, &str)]) -> Registry {
    let registry = Registry::new();
    for (id, url) in workers {
        registry
            .add_worker(WorkerEndpoint::new(*id, url, true, 100))
            .unwrap();
    }
    registry
}

/// Sync facade backed by a mock KV server.
pub fn sync_against(api_base: &str, registry: Registry) -> ConfigSync {
    ConfigSync::new(
        Arc::new(kv_client(api_base)),
        Arc::new(registry),
        fast_cascade(),
    )
}
