//! Cache invalidation cascade.
//!
//! After a configuration write, every affected worker is asked to drop its
//! local cache with `POST <base_url>/cache/clear`. The cascade is
//! best-effort: failures are collected into a [`CascadeResult`] and never
//! turn the write into an error.

use crate::config::CascadeConfig;
use crate::registry::Registry;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Per-worker outcome of a cache-clear request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearStatus {
    Cleared,
    /// Worker has no cache-clear endpoint; counts as success
    NotSupported,
    Failed,
    /// Worker has no base URL
    Skipped,
}

impl ClearStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearStatus::Cleared => "cleared",
            ClearStatus::NotSupported => "not_supported",
            ClearStatus::Failed => "failed",
            ClearStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ClearStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerClear {
    pub status: ClearStatus,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_code: Option<u16>,
}

/// Aggregate outcome of one cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeResult {
    pub attempted: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub per_worker: BTreeMap<String, WorkerClear>,
}

impl CascadeResult {
    fn record(&mut self, worker_id: String, clear: WorkerClear) {
        match clear.status {
            ClearStatus::Cleared | ClearStatus::NotSupported => {
                self.attempted += 1;
                self.successful += 1;
            }
            ClearStatus::Failed => {
                self.attempted += 1;
                self.failed += 1;
            }
            ClearStatus::Skipped => self.skipped += 1,
        }
        self.per_worker.insert(worker_id, clear);
    }

    /// Structured detail when some workers could not be notified.
    pub fn partial_failure(&self) -> Option<PartialCascadeFailure> {
        if self.failed == 0 {
            return None;
        }
        let failed_workers = self
            .per_worker
            .iter()
            .filter(|(_, clear)| clear.status == ClearStatus::Failed)
            .map(|(id, clear)| (id.clone(), clear.detail.clone()))
            .collect();
        Some(PartialCascadeFailure {
            failed: self.failed,
            attempted: self.attempted,
            failed_workers,
        })
    }
}

/// A successful write whose cascade did not reach every worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("saved, but {failed} of {attempted} workers could not be notified")]
pub struct PartialCascadeFailure {
    pub failed: usize,
    pub attempted: usize,
    /// Worker id and failure detail
    pub failed_workers: Vec<(String, String)>,
}

/// Sends cache-clear requests to workers.
pub struct Cascade {
    client: reqwest::Client,
    config: CascadeConfig,
}

impl Cascade {
    pub fn new(config: CascadeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(config, client))
    }

    /// Create a cascade with a custom HTTP client (for testing).
    pub fn with_client(config: CascadeConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    /// Ask each of `worker_ids` to clear its cache.
    ///
    /// Workers without a base URL (or unknown to the registry) are skipped.
    pub async fn cascade(&self, registry: &Registry, worker_ids: &[String]) -> CascadeResult {
        let mut result = CascadeResult::default();
        let mut targets = Vec::new();

        for id in worker_ids {
            match registry.base_url(id) {
                Some(url) => targets.push((id.clone(), url)),
                None => result.record(
                    id.clone(),
                    WorkerClear {
                        status: ClearStatus::Skipped,
                        detail: "no base URL configured".to_string(),
                        http_code: None,
                    },
                ),
            }
        }

        if targets.is_empty() {
            return result;
        }

        let bound = match self.config.max_concurrency {
            0 => targets.len(),
            n => n,
        };
        let timestamp = chrono::Utc::now().to_rfc3339();

        let outcomes: Vec<(String, WorkerClear)> = stream::iter(targets)
            .map(|(id, base_url)| {
                let timestamp = timestamp.clone();
                async move {
                    let clear = self.clear_one(&id, &base_url, &timestamp).await;
                    (id, clear)
                }
            })
            .buffer_unordered(bound)
            .collect()
            .await;

        for (id, clear) in outcomes {
            result.record(id, clear);
        }

        tracing::info!(
            attempted = result.attempted,
            successful = result.successful,
            failed = result.failed,
            skipped = result.skipped,
            "Cache cascade completed"
        );
        result
    }

    async fn clear_one(&self, worker_id: &str, base_url: &str, timestamp: &str) -> WorkerClear {
        let url = format!("{base_url}/cache/clear");
        let body = json!({
            "force": true,
            "reason": "config_update",
            "timestamp": timestamp,
        });

        let response = match self
            .client
            .post(&url)
            .json(&body)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let detail = if e.is_timeout() {
                    format!("request timeout after {}s", self.config.timeout_seconds)
                } else {
                    format!("connection failed: {e}")
                };
                tracing::warn!(worker_id, error = %detail, "Cache clear failed");
                record_request("error");
                return WorkerClear {
                    status: ClearStatus::Failed,
                    detail,
                    http_code: None,
                };
            }
        };

        let code = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        let clear = if (200..300).contains(&code) {
            WorkerClear {
                status: ClearStatus::Cleared,
                detail: "cache cleared".to_string(),
                http_code: Some(code),
            }
        } else if code == 404 {
            WorkerClear {
                status: ClearStatus::NotSupported,
                detail: "worker has no cache clear endpoint".to_string(),
                http_code: Some(code),
            }
        } else {
            WorkerClear {
                status: ClearStatus::Failed,
                detail: failure_detail(code, &text),
                http_code: Some(code),
            }
        };

        record_request(clear.status.as_str());
        tracing::debug!(
            worker_id,
            http_code = code,
            status = %clear.status,
            "Cache clear response"
        );
        clear
    }
}

fn failure_detail(code: u16, body: &str) -> String {
    let error = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string));
    match error {
        Some(error) => format!("HTTP {code}: {error}"),
        None if body.trim().is_empty() => format!("HTTP {code}"),
        None => format!("HTTP {code}: {}", body.trim()),
    }
}

fn record_request(outcome: &'static str) {
    metrics::counter!("faqsync_cascade_requests_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::WorkerEndpoint;
    use mockito::{Matcher, Server};

    fn test_cascade() -> Cascade {
        let config = CascadeConfig {
            timeout_seconds: 2,
            max_concurrency: 0,
        };
        Cascade::with_client(config, reqwest::Client::new())
    }

    fn registry_with(workers: &[(&str, &str)]) -> Registry {
        let registry = Registry::new();
        for (id, url) in workers {
            registry
                .add_worker(WorkerEndpoint::new(*id, url, true, 100))
                .unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_cleared_sends_force_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/cache/clear")
            .match_body(Matcher::PartialJson(json!({
                "force": true,
                "reason": "config_update"
            })))
            .with_status(200)
            .create_async()
            .await;

        let registry = registry_with(&[("answer_generator", server.url().as_str())]);
        let result = test_cascade()
            .cascade(&registry, &["answer_generator".to_string()])
            .await;

        mock.assert_async().await;
        assert_eq!(result.attempted, 1);
        assert_eq!(result.successful, 1);
        assert_eq!(
            result.per_worker["answer_generator"].status,
            ClearStatus::Cleared
        );
        assert!(result.partial_failure().is_none());
    }

    #[tokio::test]
    async fn test_not_found_counts_as_success() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/cache/clear")
            .with_status(404)
            .create_async()
            .await;

        let registry = registry_with(&[("seo_analyzer", server.url().as_str())]);
        let result = test_cascade()
            .cascade(&registry, &["seo_analyzer".to_string()])
            .await;

        assert_eq!(result.successful, 1);
        assert_eq!(
            result.per_worker["seo_analyzer"].status,
            ClearStatus::NotSupported
        );
    }

    #[tokio::test]
    async fn test_failure_captures_error_field() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/cache/clear")
            .with_status(500)
            .with_body(r#"{"error":"kv unavailable"}"#)
            .create_async()
            .await;

        let registry = registry_with(&[("faq_enhancer", server.url().as_str())]);
        let result = test_cascade()
            .cascade(&registry, &["faq_enhancer".to_string()])
            .await;

        let clear = &result.per_worker["faq_enhancer"];
        assert_eq!(clear.status, ClearStatus::Failed);
        assert_eq!(clear.detail, "HTTP 500: kv unavailable");
        assert_eq!(clear.http_code, Some(500));

        let partial = result.partial_failure().unwrap();
        assert_eq!(
            partial.to_string(),
            "saved, but 1 of 1 workers could not be notified"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_worker_skipped() {
        let registry = registry_with(&[("topic_generator", "")]);
        let result = test_cascade()
            .cascade(
                &registry,
                &["topic_generator".to_string(), "unknown".to_string()],
            )
            .await;

        assert_eq!(result.attempted, 0);
        assert_eq!(result.skipped, 2);
        assert_eq!(
            result.per_worker["topic_generator"].status,
            ClearStatus::Skipped
        );
    }

    #[test]
    fn test_failure_detail_variants() {
        assert_eq!(failure_detail(502, ""), "HTTP 502");
        assert_eq!(failure_detail(502, "bad gateway"), "HTTP 502: bad gateway");
        assert_eq!(
            failure_detail(429, r#"{"error":"slow down"}"#),
            "HTTP 429: slow down"
        );
    }
}
