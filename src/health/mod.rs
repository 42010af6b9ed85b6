//! Worker probing module.
//!
//! Determines whether a deployed worker is reachable and coherent by trying
//! an ordered sequence of connectivity strategies, returning the first
//! healthy outcome together with a trail of every attempt.

mod config;
mod error;
mod payload;
mod state;
mod strategy;

#[cfg(test)]
mod tests;

pub use config::*;
pub use error::*;
pub use payload::synthetic_payload;
pub use state::*;
pub use strategy::*;

use crate::model::{resolve_for_worker, ModelResolution};
use crate::registry::{normalize_base_url, Registry, WorkerEndpoint, WorkerType};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One worker's entry in a probe-all run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerProbe {
    pub worker_id: String,
    pub display_name: String,
    pub result: ProbeResult,
    pub model: ModelResolution,
}

/// Outcome of probing every probeable worker.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeSummary {
    pub total: usize,
    pub successful: usize,
    /// Percentage of healthy workers, 0 when nothing was probed
    pub success_rate: f64,
    pub results: Vec<WorkerProbe>,
    /// Disabled workers and workers without a URL
    pub skipped: Vec<String>,
}

impl ProbeSummary {
    fn new(results: Vec<WorkerProbe>, skipped: Vec<String>) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.result.is_healthy()).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            successful as f64 * 100.0 / total as f64
        };
        Self {
            total,
            successful,
            success_rate,
            results,
            skipped,
        }
    }
}

/// Runs connectivity probes against workers.
pub struct Prober {
    /// HTTP client with connection pooling
    client: reqwest::Client,
    config: ProbeConfig,
    strategies: Vec<Box<dyn ProbeStrategy>>,
    /// Optional channel that receives each scheduled cycle's summary
    broadcast: Option<tokio::sync::broadcast::Sender<ProbeSummary>>,
}

impl Prober {
    /// Create a prober with the default strategy sequence.
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProbeError::ConnectionFailed(e.to_string()))?;
        Ok(Self::with_client(config, client))
    }

    /// Create a prober with a custom HTTP client (for testing).
    pub fn with_client(config: ProbeConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            config,
            strategies: default_strategies(),
            broadcast: None,
        }
    }

    /// Replace the strategy sequence.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ProbeStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Publish every scheduled cycle's summary on `sender`.
    pub fn with_broadcast(mut self, sender: tokio::sync::broadcast::Sender<ProbeSummary>) -> Self {
        self.broadcast = Some(sender);
        self
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probe a worker by id and base URL.
    ///
    /// Strategies run in order and the first healthy outcome is returned.
    /// When nothing is healthy the first warning is returned, otherwise the
    /// last attempt.
    pub async fn probe(&self, worker_id: &str, base_url: &str) -> ProbeResult {
        let normalized = normalize_base_url(base_url);
        if let Err(e) = validate_base_url(&normalized) {
            tracing::warn!(worker_id, error = %e, "Skipping probe");
            return ProbeResult::not_attempted(e.to_string());
        }

        let target = ProbeTarget {
            worker_id: worker_id.to_string(),
            worker_type: worker_id.parse::<WorkerType>().ok(),
            base_url: normalized,
        };
        let ctx = ProbeContext {
            client: &self.client,
            timeout: Duration::from_secs(self.config.timeout_seconds),
            origin: &self.config.origin,
        };

        let start = Instant::now();
        let mut attempts: Vec<StrategyAttempt> = Vec::with_capacity(self.strategies.len());
        let mut selected: Option<usize> = None;
        let mut warning: Option<usize> = None;

        for strategy in &self.strategies {
            let attempt = strategy.attempt(&ctx, &target).await;
            tracing::debug!(
                worker_id,
                strategy = %attempt.strategy,
                status = %attempt.status,
                http_code = attempt.http_code,
                elapsed_ms = attempt.elapsed_ms,
                "Probe strategy finished"
            );

            let status = attempt.status;
            attempts.push(attempt);
            match status {
                ProbeStatus::Healthy => {
                    selected = Some(attempts.len() - 1);
                    break;
                }
                ProbeStatus::Warning if warning.is_none() => warning = Some(attempts.len() - 1),
                _ => {}
            }
        }

        let response_time_ms = start.elapsed().as_millis() as u64;
        metrics::histogram!("faqsync_probe_duration_seconds",
            "worker" => worker_id.to_string()
        )
        .record(response_time_ms as f64 / 1000.0);

        let Some(chosen) = selected.or(warning).or(attempts.len().checked_sub(1)) else {
            return ProbeResult::not_attempted("no probe strategies configured");
        };

        let outcome = &attempts[chosen];
        let result = ProbeResult {
            status: outcome.status,
            strategy_used: Some(outcome.strategy),
            http_code: outcome.http_code,
            response_time_ms,
            body: outcome
                .body
                .clone()
                .or_else(|| attempts.iter().find_map(|a| a.body.clone())),
            diagnostics: attempts.iter().map(StrategyAttempt::diagnostic).collect(),
            attempts,
        };

        tracing::info!(
            worker_id,
            status = %result.status,
            strategy = ?result.strategy_used,
            elapsed_ms = result.response_time_ms,
            "Probe completed"
        );
        result
    }

    /// Probe a registered worker.
    pub async fn probe_worker(&self, worker: &WorkerEndpoint) -> ProbeResult {
        self.probe(&worker.id, &worker.base_url).await
    }

    /// Probe a worker and resolve the model it reports.
    pub async fn probe_with_model(&self, worker: &WorkerEndpoint) -> WorkerProbe {
        let result = self.probe_worker(worker).await;
        let model = resolve_for_worker(worker.worker_type(), result.body.as_ref());
        WorkerProbe {
            worker_id: worker.id.clone(),
            display_name: worker.display_name(),
            result,
            model,
        }
    }

    /// Probe every enabled worker with a URL, one at a time, with a fixed
    /// stagger between consecutive probes.
    pub async fn check_all(&self, registry: &Registry) -> ProbeSummary {
        let stagger = Duration::from_millis(self.config.stagger_ms);
        let (probeable, skipped): (Vec<_>, Vec<_>) = registry
            .get_all_workers()
            .into_iter()
            .partition(WorkerEndpoint::is_probeable);
        let skipped: Vec<String> = skipped.into_iter().map(|w| w.id).collect();
        let mut results = Vec::new();

        for worker in probeable {
            if !results.is_empty() && !stagger.is_zero() {
                tokio::time::sleep(stagger).await;
            }
            results.push(self.probe_with_model(&worker).await);
        }

        let summary = ProbeSummary::new(results, skipped);
        tracing::info!(
            total = summary.total,
            successful = summary.successful,
            success_rate = summary.success_rate,
            "Probe cycle completed"
        );
        summary
    }

    /// Start the scheduled probe loop.
    ///
    /// Returns a JoinHandle that completes when the cancellation token is triggered.
    pub fn start(self, registry: Arc<Registry>, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(self.config.interval_seconds.max(1)));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = self.config.interval_seconds,
                "Prober started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Prober shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let summary = self.check_all(&registry).await;
                        if let Some(ref sender) = self.broadcast {
                            // No receivers is fine
                            let _ = sender.send(summary);
                        }
                    }
                }
            }
        })
    }
}

/// Reject base URLs that would never reach a worker.
pub fn validate_base_url(url: &str) -> Result<(), ProbeError> {
    if url.is_empty() {
        return Err(ProbeError::InvalidUrl("no base URL configured".to_string()));
    }
    let parsed =
        reqwest::Url::parse(url).map_err(|e| ProbeError::InvalidUrl(format!("{url}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ProbeError::InvalidUrl(format!(
            "{url}: expected an http(s) URL with a host"
        )));
    }
    Ok(())
}
