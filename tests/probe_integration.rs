//! Integration tests for the prober against mock workers.

mod common;

use common::{fast_prober, registry_with};
use faqsync::health::{ProbeStatus, ProbeSummary, StrategyKind};
use faqsync::model::ModelResolution;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_healthy_get_reports_model() {
    let worker = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "healthy",
            "current_model": "@cf/meta/llama-3.3-70b-instruct-fp8-fast",
            "model_source": "kv_config",
        })))
        .expect(1)
        .mount(&worker)
        .await;

    let registry = registry_with(&[("question_generator", worker.uri().as_str())]);
    let summary = fast_prober().check_all(&registry).await;

    assert_eq!(summary.total, 1);
    assert_eq!(summary.successful, 1);
    let probe = &summary.results[0];
    assert_eq!(probe.result.strategy_used, Some(StrategyKind::Get));
    match &probe.model {
        ModelResolution::Configured(info) => {
            assert_eq!(info.model_id, "@cf/meta/llama-3.3-70b-instruct-fp8-fast");
            assert_eq!(info.display_name, "Llama 3.3 70B Instruct FP8 Fast");
            assert_eq!(info.reported_source.as_deref(), Some("kv_config"));
        }
        other => panic!("expected configured model, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fallback_stops_at_first_healthy_strategy() {
    let worker = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&worker)
        .await;
    Mock::given(method("OPTIONS"))
        .and(header("access-control-request-method", "POST"))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("access-control-allow-origin", "*")
                .insert_header("access-control-allow-methods", "POST, OPTIONS"),
        )
        .expect(1)
        .mount(&worker)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&worker)
        .await;

    let result = fast_prober().probe("seo_analyzer", worker.uri().as_str()).await;

    assert_eq!(result.status, ProbeStatus::Healthy);
    assert_eq!(result.strategy_used, Some(StrategyKind::Options));
    assert_eq!(result.attempts.len(), 2);
    assert_eq!(result.attempts[0].status, ProbeStatus::Error);
    assert_eq!(result.diagnostics.len(), 2);
}

#[tokio::test]
async fn test_post_fallback_treats_client_error_as_reachable() {
    let worker = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&worker)
        .await;
    Mock::given(method("OPTIONS"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&worker)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "missing url"})),
        )
        .expect(1)
        .mount(&worker)
        .await;

    let result = fast_prober().probe("faq_extractor", worker.uri().as_str()).await;

    assert_eq!(result.status, ProbeStatus::Healthy);
    assert_eq!(result.strategy_used, Some(StrategyKind::Post));
    assert_eq!(result.http_code, Some(400));
}

#[tokio::test]
async fn test_all_strategies_failing_returns_last_attempt() {
    let worker = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(503))
        .mount(&worker)
        .await;

    let result = fast_prober().probe("answer_generator", worker.uri().as_str()).await;

    assert_eq!(result.status, ProbeStatus::Error);
    assert_eq!(result.strategy_used, Some(StrategyKind::Post));
    assert_eq!(result.attempts.len(), 3);
    assert!(!result.is_healthy());
}

#[tokio::test]
async fn test_unreachable_worker_is_error_not_panic() {
    let result = fast_prober().probe("seo_analyzer", "http://127.0.0.1:1").await;
    assert_eq!(result.status, ProbeStatus::Error);
    assert_eq!(result.attempts.len(), 3);
}

#[tokio::test]
async fn test_proxy_worker_reports_proxy_model() {
    let worker = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
        .mount(&worker)
        .await;

    let registry = registry_with(&[("faq_extractor", worker.uri().as_str())]);
    let summary = fast_prober().check_all(&registry).await;

    assert_eq!(summary.results[0].model.label(), "N/A (Proxy Service)");
}

#[tokio::test]
async fn test_scheduled_probe_broadcasts_and_stops() {
    let worker = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
        .mount(&worker)
        .await;

    let registry = Arc::new(registry_with(&[("topic_generator", worker.uri().as_str())]));
    let (tx, mut rx) = tokio::sync::broadcast::channel::<ProbeSummary>(4);
    let cancel_token = CancellationToken::new();
    let handle = fast_prober()
        .with_broadcast(tx)
        .start(registry, cancel_token.clone());

    let summary = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no probe cycle within timeout")
        .unwrap();
    assert_eq!(summary.successful, 1);

    cancel_token.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("prober did not stop")
        .unwrap();
}
