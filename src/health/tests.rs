//! Unit tests for health module.

use super::*;
use async_trait::async_trait;
use mockito::Server;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

fn test_prober() -> Prober {
    let config = ProbeConfig {
        timeout_seconds: 2,
        stagger_ms: 0,
        ..ProbeConfig::default()
    };
    Prober::with_client(config, reqwest::Client::new())
}

// ============================================================================
// ProbeConfig / ProbeError
// ============================================================================

#[test]
fn test_config_default_values() {
    let config = ProbeConfig::default();
    assert_eq!(config.timeout_seconds, 15);
    assert_eq!(config.stagger_ms, 500);
    assert_eq!(config.interval_seconds, 300);
}

#[test]
fn test_config_partial_toml() {
    let config: ProbeConfig = toml::from_str("stagger_ms = 0").unwrap();
    assert_eq!(config.stagger_ms, 0);
    assert_eq!(config.timeout_seconds, 15);
}

#[test]
fn test_error_display() {
    assert_eq!(
        ProbeError::Timeout(15).to_string(),
        "request timeout after 15s"
    );
    assert_eq!(ProbeError::HttpError(503).to_string(), "HTTP error: 503");
}

// ============================================================================
// Health body classification
// ============================================================================

#[test]
fn test_classify_healthy_status_values() {
    for body in [
        r#"{"status":"healthy"}"#,
        r#"{"status":"OK"}"#,
        r#"{"status":"online"}"#,
        r#"{"status":true}"#,
    ] {
        let (status, _, parsed) = classify_health_body(body);
        assert_eq!(status, ProbeStatus::Healthy, "{body}");
        assert!(parsed.is_some());
    }
}

#[test]
fn test_classify_other_status_is_unhealthy() {
    let (status, note, _) = classify_health_body(r#"{"status":"degraded"}"#);
    assert_eq!(status, ProbeStatus::Unhealthy);
    assert!(note.contains("degraded"));

    let (status, _, _) = classify_health_body(r#"{"status":false}"#);
    assert_eq!(status, ProbeStatus::Unhealthy);
}

#[test]
fn test_classify_json_without_status_is_healthy() {
    let (status, _, body) = classify_health_body(r#"{"current_model":"@cf/meta/x"}"#);
    assert_eq!(status, ProbeStatus::Healthy);
    assert_eq!(body.unwrap()["current_model"], "@cf/meta/x");
}

#[test]
fn test_classify_empty_bodies_unhealthy() {
    for body in ["", "   ", "{}", "[]", "null", "\"\""] {
        let (status, note, _) = classify_health_body(body);
        assert_eq!(status, ProbeStatus::Unhealthy, "{body:?}");
        assert_eq!(note, "empty health response");
    }
}

#[test]
fn test_classify_plain_text_is_healthy() {
    let (status, _, body) = classify_health_body("OK");
    assert_eq!(status, ProbeStatus::Healthy);
    assert!(body.is_none());
}

// ============================================================================
// URL validation
// ============================================================================

#[test]
fn test_validate_base_url() {
    assert!(validate_base_url("https://w.example.dev").is_ok());
    assert!(validate_base_url("http://127.0.0.1:8787").is_ok());
    assert!(matches!(
        validate_base_url(""),
        Err(ProbeError::InvalidUrl(_))
    ));
    assert!(validate_base_url("not a url").is_err());
    assert!(validate_base_url("ftp://w.example.dev").is_err());
}

#[tokio::test]
async fn test_invalid_url_yields_error_without_traffic() {
    let prober = test_prober();
    let result = prober.probe("answer_generator", "::nope::").await;

    assert_eq!(result.status, ProbeStatus::Error);
    assert!(result.strategy_used.is_none());
    assert!(result.attempts.is_empty());
    assert_eq!(result.diagnostics.len(), 1);
}

// ============================================================================
// Strategy sequence against a live mock
// ============================================================================

#[tokio::test]
async fn test_get_health_success_stops_early() {
    let mut server = Server::new_async().await;
    let health = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(r#"{"status":"healthy","current_model":"@cf/meta/llama-3.1-8b-instruct"}"#)
        .create_async()
        .await;
    let options = server
        .mock("OPTIONS", "/")
        .expect(0)
        .create_async()
        .await;

    let prober = test_prober();
    let result = prober.probe("answer_generator", &server.url()).await;

    health.assert_async().await;
    options.assert_async().await;
    assert_eq!(result.status, ProbeStatus::Healthy);
    assert_eq!(result.strategy_used, Some(StrategyKind::Get));
    assert_eq!(result.http_code, Some(200));
    assert_eq!(result.attempts.len(), 1);
}

#[tokio::test]
async fn test_trailing_slash_is_normalized() {
    let mut server = Server::new_async().await;
    let health = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(r#"{"status":"ok"}"#)
        .create_async()
        .await;

    let prober = test_prober();
    let result = prober
        .probe("answer_generator", &format!("{}/", server.url()))
        .await;

    health.assert_async().await;
    assert!(result.is_healthy());
}

#[tokio::test]
async fn test_options_warning_retained_when_post_fails() {
    let mut server = Server::new_async().await;
    let _health = server
        .mock("GET", "/health")
        .with_status(404)
        .create_async()
        .await;
    let _options = server
        .mock("OPTIONS", "/")
        .with_status(405)
        .create_async()
        .await;
    let _post = server
        .mock("POST", "/")
        .with_status(502)
        .create_async()
        .await;

    let prober = test_prober();
    let result = prober.probe("seo_analyzer", &server.url()).await;

    assert_eq!(result.status, ProbeStatus::Warning);
    assert_eq!(result.strategy_used, Some(StrategyKind::Options));
    assert_eq!(result.attempts.len(), 3);
    assert_eq!(result.diagnostics.len(), 3);
}

#[tokio::test]
async fn test_post_client_error_is_healthy_with_note() {
    let mut server = Server::new_async().await;
    let _health = server
        .mock("GET", "/health")
        .with_status(500)
        .create_async()
        .await;
    let _options = server
        .mock("OPTIONS", "/")
        .with_status(500)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/")
        .match_body(mockito::Matcher::PartialJson(json!({"mode": "analyze"})))
        .with_status(400)
        .with_body(r#"{"error":"content too short"}"#)
        .create_async()
        .await;

    let prober = test_prober();
    let result = prober.probe("seo_analyzer", &server.url()).await;

    post.assert_async().await;
    assert_eq!(result.status, ProbeStatus::Healthy);
    assert_eq!(result.strategy_used, Some(StrategyKind::Post));
    assert_eq!(result.http_code, Some(400));
    assert!(result.message().contains("content too short"));
}

#[tokio::test]
async fn test_all_strategies_fail_returns_post_error() {
    let mut server = Server::new_async().await;
    let _health = server
        .mock("GET", "/health")
        .with_status(503)
        .create_async()
        .await;
    let _options = server
        .mock("OPTIONS", "/")
        .with_status(503)
        .create_async()
        .await;
    let _post = server
        .mock("POST", "/")
        .with_status(503)
        .create_async()
        .await;

    let prober = test_prober();
    let result = prober.probe("topic_generator", &server.url()).await;

    assert_eq!(result.status, ProbeStatus::Error);
    assert_eq!(result.strategy_used, Some(StrategyKind::Post));
    assert_eq!(result.http_code, Some(503));
}

// ============================================================================
// Substituted strategies
// ============================================================================

struct Fixed {
    kind: StrategyKind,
    status: ProbeStatus,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ProbeStrategy for Fixed {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    async fn attempt(&self, _ctx: &ProbeContext<'_>, _target: &ProbeTarget) -> StrategyAttempt {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StrategyAttempt::new(self.kind, self.status, "fixed")
    }
}

fn fixed(kind: StrategyKind, status: ProbeStatus) -> (Box<dyn ProbeStrategy>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let strategy = Fixed {
        kind,
        status,
        calls: calls.clone(),
    };
    (Box::new(strategy), calls)
}

#[tokio::test]
async fn test_first_healthy_wins_and_later_strategies_skipped() {
    let (get, get_calls) = fixed(StrategyKind::Get, ProbeStatus::Error);
    let (options, options_calls) = fixed(StrategyKind::Options, ProbeStatus::Healthy);
    let (post, post_calls) = fixed(StrategyKind::Post, ProbeStatus::Healthy);

    let prober = test_prober().with_strategies(vec![get, options, post]);
    let result = prober.probe("faq_enhancer", "https://w.example.dev").await;

    assert_eq!(result.strategy_used, Some(StrategyKind::Options));
    assert_eq!(get_calls.load(Ordering::SeqCst), 1);
    assert_eq!(options_calls.load(Ordering::SeqCst), 1);
    assert_eq!(post_calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.diagnostics.len(), 2);
}

#[tokio::test]
async fn test_no_strategies_is_error() {
    let prober = test_prober().with_strategies(Vec::new());
    let result = prober.probe("faq_enhancer", "https://w.example.dev").await;
    assert_eq!(result.status, ProbeStatus::Error);
    assert!(result.strategy_used.is_none());
}

// ============================================================================
// Probe-all
// ============================================================================

#[tokio::test]
async fn test_check_all_counts_and_skips() {
    let (get, calls) = fixed(StrategyKind::Get, ProbeStatus::Healthy);
    let prober = test_prober().with_strategies(vec![get]);

    let registry = Registry::new();
    registry
        .add_worker(WorkerEndpoint::new("answer_generator", "https://a.example", true, 100))
        .unwrap();
    registry
        .add_worker(WorkerEndpoint::new("faq_extractor", "https://e.example", true, 100))
        .unwrap();
    registry
        .add_worker(WorkerEndpoint::new("seo_analyzer", "https://s.example", false, 100))
        .unwrap();
    registry
        .add_worker(WorkerEndpoint::new("topic_generator", "", true, 100))
        .unwrap();

    let summary = prober.check_all(&registry).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.success_rate, 100.0);
    assert_eq!(summary.skipped, vec!["seo_analyzer", "topic_generator"]);

    let extractor = summary
        .results
        .iter()
        .find(|r| r.worker_id == "faq_extractor")
        .unwrap();
    assert_eq!(extractor.model.label(), crate::model::PROXY_SERVICE);
}

#[tokio::test]
async fn test_check_all_empty_registry() {
    let summary = test_prober().check_all(&Registry::new()).await;
    assert_eq!(summary.total, 0);
    assert_eq!(summary.success_rate, 0.0);
}

#[tokio::test]
async fn test_start_stops_on_cancel() {
    let (get, _) = fixed(StrategyKind::Get, ProbeStatus::Healthy);
    let (sender, mut receiver) = tokio::sync::broadcast::channel(4);
    let prober = test_prober()
        .with_strategies(vec![get])
        .with_broadcast(sender);

    let registry = Arc::new(Registry::new());
    registry
        .add_worker(WorkerEndpoint::new("answer_generator", "https://a.example", true, 100))
        .unwrap();

    let cancel = CancellationToken::new();
    let handle = prober.start(registry, cancel.clone());

    let summary = receiver.recv().await.unwrap();
    assert_eq!(summary.total, 1);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}
