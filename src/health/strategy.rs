//! Connectivity strategies tried in order by the prober.

use super::payload::synthetic_payload;
use super::{ProbeError, ProbeStatus, StrategyAttempt, StrategyKind};
use crate::registry::WorkerType;
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Shared request settings for one probe.
pub struct ProbeContext<'a> {
    pub client: &'a reqwest::Client,
    pub timeout: Duration,
    /// Sent as `Origin` on preflight and POST
    pub origin: &'a str,
}

/// The worker being probed.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub worker_id: String,
    pub worker_type: Option<WorkerType>,
    /// Normalized, validated base URL
    pub base_url: String,
}

/// One connectivity technique.
#[async_trait]
pub trait ProbeStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Run the strategy. Transport failures are reported as an
    /// [`ProbeStatus::Error`] attempt, never as a panic or `Err`.
    async fn attempt(&self, ctx: &ProbeContext<'_>, target: &ProbeTarget) -> StrategyAttempt;
}

/// The default sequence: GET `/health`, then OPTIONS, then POST.
pub fn default_strategies() -> Vec<Box<dyn ProbeStrategy>> {
    vec![
        Box::new(GetHealth),
        Box::new(OptionsPreflight),
        Box::new(PostPayload),
    ]
}

/// Values of `status` that mean healthy.
const HEALTHY_STATUSES: [&str; 3] = ["healthy", "ok", "online"];

/// Classify a 2xx `/health` response body.
pub fn classify_health_body(text: &str) -> (ProbeStatus, String, Option<Value>) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return (
            ProbeStatus::Unhealthy,
            "empty health response".to_string(),
            None,
        );
    }

    let Ok(body) = serde_json::from_str::<Value>(trimmed) else {
        return (
            ProbeStatus::Healthy,
            "health endpoint answered with a non-JSON body".to_string(),
            None,
        );
    };

    let is_empty = match &body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    };
    if is_empty {
        return (
            ProbeStatus::Unhealthy,
            "empty health response".to_string(),
            Some(body),
        );
    }

    match body.get("status") {
        Some(Value::Bool(true)) => (ProbeStatus::Healthy, "status: true".to_string(), Some(body)),
        Some(Value::String(s)) if HEALTHY_STATUSES.contains(&s.to_lowercase().as_str()) => {
            let note = format!("status: {s}");
            (ProbeStatus::Healthy, note, Some(body))
        }
        Some(other) => {
            let reported = other
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string());
            (
                ProbeStatus::Unhealthy,
                format!("worker reported status: {reported}"),
                Some(body),
            )
        }
        None => (
            ProbeStatus::Healthy,
            "health endpoint returned data".to_string(),
            Some(body),
        ),
    }
}

fn transport_failure(kind: StrategyKind, e: reqwest::Error, timeout: Duration) -> StrategyAttempt {
    let error = ProbeError::from_reqwest(e, timeout.as_secs());
    StrategyAttempt::new(kind, ProbeStatus::Error, error.to_string())
}

fn error_field(body: Option<&Value>) -> Option<String> {
    match body?.get("error")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// GET `<base>/health`.
pub struct GetHealth;

#[async_trait]
impl ProbeStrategy for GetHealth {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Get
    }

    async fn attempt(&self, ctx: &ProbeContext<'_>, target: &ProbeTarget) -> StrategyAttempt {
        let start = Instant::now();
        let url = format!("{}/health", target.base_url);

        let response = match ctx.client.get(&url).timeout(ctx.timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                return transport_failure(self.kind(), e, ctx.timeout)
                    .with_elapsed_ms(start.elapsed().as_millis() as u64)
            }
        };

        let code = response.status().as_u16();
        if !response.status().is_success() {
            return StrategyAttempt::new(
                self.kind(),
                ProbeStatus::Error,
                ProbeError::HttpError(code).to_string(),
            )
            .with_http_code(code)
            .with_elapsed_ms(start.elapsed().as_millis() as u64);
        }

        let attempt = match response.text().await {
            Ok(text) => {
                let (status, note, body) = classify_health_body(&text);
                StrategyAttempt::new(self.kind(), status, note).with_body(body)
            }
            Err(e) => StrategyAttempt::new(
                self.kind(),
                ProbeStatus::Error,
                ProbeError::ParseError(e.to_string()).to_string(),
            ),
        };
        attempt
            .with_http_code(code)
            .with_elapsed_ms(start.elapsed().as_millis() as u64)
    }
}

/// CORS preflight against the base URL.
pub struct OptionsPreflight;

#[async_trait]
impl ProbeStrategy for OptionsPreflight {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Options
    }

    async fn attempt(&self, ctx: &ProbeContext<'_>, target: &ProbeTarget) -> StrategyAttempt {
        let start = Instant::now();
        let result = ctx
            .client
            .request(reqwest::Method::OPTIONS, &target.base_url)
            .header("Origin", ctx.origin)
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "Content-Type")
            .timeout(ctx.timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                return transport_failure(self.kind(), e, ctx.timeout)
                    .with_elapsed_ms(start.elapsed().as_millis() as u64)
            }
        };

        let code = response.status().as_u16();
        let allow_headers: Vec<String> = response
            .headers()
            .iter()
            .filter(|(name, _)| name.as_str().starts_with("access-control-allow-"))
            .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
            .collect();
        let has_allow_origin = response
            .headers()
            .contains_key("access-control-allow-origin");

        let attempt = if response.status().is_success() && has_allow_origin {
            StrategyAttempt::new(
                self.kind(),
                ProbeStatus::Healthy,
                format!("CORS preflight accepted [{}]", allow_headers.join("; ")),
            )
        } else if code == 403 || code == 405 {
            StrategyAttempt::new(
                self.kind(),
                ProbeStatus::Warning,
                format!("CORS preflight rejected with HTTP {code}"),
            )
        } else if response.status().is_success() {
            StrategyAttempt::new(
                self.kind(),
                ProbeStatus::Error,
                "preflight answered without Access-Control-Allow-Origin",
            )
        } else {
            StrategyAttempt::new(
                self.kind(),
                ProbeStatus::Error,
                ProbeError::HttpError(code).to_string(),
            )
        };
        attempt
            .with_http_code(code)
            .with_elapsed_ms(start.elapsed().as_millis() as u64)
    }
}

/// POST a synthetic request to the base URL.
pub struct PostPayload;

#[async_trait]
impl ProbeStrategy for PostPayload {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Post
    }

    async fn attempt(&self, ctx: &ProbeContext<'_>, target: &ProbeTarget) -> StrategyAttempt {
        let start = Instant::now();
        let payload = synthetic_payload(target.worker_type, ctx.origin);
        let result = ctx
            .client
            .post(&target.base_url)
            .header("Origin", ctx.origin)
            .json(&payload)
            .timeout(ctx.timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                return transport_failure(self.kind(), e, ctx.timeout)
                    .with_elapsed_ms(start.elapsed().as_millis() as u64)
            }
        };

        let code = response.status().as_u16();
        let body = response
            .text()
            .await
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok());
        let error = error_field(body.as_ref());

        let (status, mut note) = if code < 500 {
            (ProbeStatus::Healthy, format!("worker answered POST with HTTP {code}"))
        } else {
            (ProbeStatus::Error, ProbeError::HttpError(code).to_string())
        };
        if let Some(error) = error {
            note.push_str(&format!("; error: {error}"));
        }

        StrategyAttempt::new(self.kind(), status, note)
            .with_http_code(code)
            .with_body(body)
            .with_elapsed_ms(start.elapsed().as_millis() as u64)
    }
}
