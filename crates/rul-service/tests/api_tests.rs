//! Integration tests for the service API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rul_core::{
    health::{components, HealthRegistry},
    ArtifactBundle, AuditError, AuditSink, DecisionPolicy, EngineMetrics, FeatureStats,
    InferenceResult, MemoryAuditSink, PredictionError, RulEngine, RulModel, ValidationMetrics,
};
use rul_service::api::{create_router, AppState};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

/// Estimate = 70 - 10 * (a - 5); negative `a` fails the run
struct SlopeModel;

impl RulModel for SlopeModel {
    fn scale(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        Ok(features.to_vec())
    }

    fn predict(&self, scaled: &[f64]) -> Result<f64, PredictionError> {
        if scaled[0] < 0.0 {
            return Err(PredictionError::Runtime("session poisoned".to_string()));
        }
        Ok(70.0 - 10.0 * (scaled[0] - 5.0))
    }
}

struct BrokenDisk;

impl AuditSink for BrokenDisk {
    fn record(&self, _result: &InferenceResult) -> Result<(), AuditError> {
        Err(AuditError::Io {
            path: "/var/log/rul/inference.jsonl".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"),
        })
    }
}

fn bundle() -> Arc<ArtifactBundle> {
    Arc::new(
        ArtifactBundle::new(
            "baseline_v1",
            vec![
                ("a".to_string(), FeatureStats { min: 0.0, max: 10.0, mean: 5.0, std: 2.0 }),
                ("b".to_string(), FeatureStats { min: 0.0, max: 1.0, mean: 0.5, std: 0.1 }),
            ],
            DecisionPolicy { k: 1.0, lower_bound_method: None },
            ValidationMetrics { mae: 2.0, rmse: 2.5, r2: 0.7 },
        )
        .unwrap(),
    )
}

async fn setup_app(sink: Arc<dyn AuditSink>, audit_failure_fatal: bool) -> (Router, Arc<AppState>) {
    let engine = Arc::new(RulEngine::new(bundle(), Arc::new(SlopeModel), sink));

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL).await;
    health_registry.register(components::AUDIT_LOG).await;

    let state = Arc::new(
        AppState::new(engine, health_registry, EngineMetrics::new())
            .with_audit_failure_fatal(audit_failure_fatal),
    );
    (create_router(state.clone()), state)
}

fn predict_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_predict_returns_decision() {
    let sink = Arc::new(MemoryAuditSink::new());
    let (app, _state) = setup_app(sink.clone(), false).await;

    let response = app
        .oneshot(predict_request(json!({"a": 5.0, "b": 0.5})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["rul_pred"], 70.0);
    assert_eq!(body["rul_lower"], 68.0);
    assert_eq!(body["risk_band"], "GREEN");
    assert_eq!(body["recommended_action"], "CONTINUE");
    assert_eq!(body["artifact_version"], "baseline_v1");
    assert_eq!(body["audit_logged"], true);
    assert_eq!(sink.records().len(), 1);
}

#[tokio::test]
async fn test_predict_flags_extrapolation() {
    let (app, _state) = setup_app(Arc::new(MemoryAuditSink::new()), false).await;

    let response = app
        .oneshot(predict_request(json!({"a": 12.0, "b": 0.5})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["rul_pred"], 0.0);
    assert_eq!(body["risk_band"], "CRITICAL");
    assert_eq!(body["recommended_action"], "REMOVE_FROM_SERVICE");
    assert_eq!(body["flags"]["extrapolation_risk"], true);
    assert_eq!(body["flags"]["input_anomaly"], true);
}

#[tokio::test]
async fn test_predict_rejects_missing_features() {
    let sink = Arc::new(MemoryAuditSink::new());
    let (app, _state) = setup_app(sink.clone(), false).await;

    let response = app.oneshot(predict_request(json!({"a": 5.0}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert_eq!(body["kind"], "missing");
    assert_eq!(body["features"], json!(["b"]));
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn test_predict_rejects_unexpected_features() {
    let (app, _state) = setup_app(Arc::new(MemoryAuditSink::new()), false).await;

    let response = app
        .oneshot(predict_request(json!({"a": 5.0, "b": 0.5, "zeta": 1.0, "alpha": 2.0})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert_eq!(body["kind"], "unexpected");
    assert_eq!(body["features"], json!(["alpha", "zeta"]));
}

#[tokio::test]
async fn test_predict_rejects_non_numeric_body() {
    let (app, _state) = setup_app(Arc::new(MemoryAuditSink::new()), false).await;

    let response = app
        .oneshot(predict_request(json!({"a": "fast", "b": 0.5})))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(json_body(response).await["kind"], "invalid_body");
}

#[tokio::test]
async fn test_audit_failure_tolerated_by_default() {
    let (app, state) = setup_app(Arc::new(BrokenDisk), false).await;

    let response = app
        .clone()
        .oneshot(predict_request(json!({"a": 5.0, "b": 0.5})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["audit_logged"], false);
    assert_eq!(body["risk_band"], "GREEN");

    let health = state.health_registry.health().await;
    assert_eq!(
        health.components[components::AUDIT_LOG].status,
        rul_core::ComponentStatus::Degraded
    );

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "degraded");
}

#[tokio::test]
async fn test_audit_failure_fatal_returns_unlogged_result() {
    let (app, _state) = setup_app(Arc::new(BrokenDisk), true).await;

    let response = app
        .oneshot(predict_request(json!({"a": 5.0, "b": 0.5})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["kind"], "audit");
    assert_eq!(body["result"]["rul_lower"], 68.0);
    assert_eq!(body["result"]["risk_band"], "GREEN");
}

#[tokio::test]
async fn test_prediction_failure_degrades_model_until_recovery() {
    let sink = Arc::new(MemoryAuditSink::new());
    let (app, state) = setup_app(sink.clone(), false).await;

    let response = app
        .clone()
        .oneshot(predict_request(json!({"a": -1.0, "b": 0.5})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["kind"], "prediction");
    assert!(sink.records().is_empty());

    let health = state.health_registry.health().await;
    let model = &health.components[components::MODEL];
    assert_eq!(model.status, rul_core::ComponentStatus::Degraded);
    assert!(model.message.as_deref().unwrap().contains("session poisoned"));

    let response = app
        .oneshot(predict_request(json!({"a": 5.0, "b": 0.5})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        state.health_registry.health().await.components[components::MODEL].status,
        rul_core::ComponentStatus::Healthy
    );
}

#[tokio::test]
async fn test_model_endpoint_describes_bundle() {
    let (app, _state) = setup_app(Arc::new(MemoryAuditSink::new()), false).await;

    let response = app.oneshot(get("/v1/model")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["artifact_version"], "baseline_v1");
    assert_eq!(body["feature_order"], json!(["a", "b"]));
    assert_eq!(body["decision_policy"]["k"], 1.0);
    assert_eq!(body["validation_metrics"]["mae"], 2.0);
    assert_eq!(body["bundle_digest"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_readyz_follows_registry() {
    let (app, state) = setup_app(Arc::new(MemoryAuditSink::new()), false).await;

    let response = app.clone().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    state.health_registry.mark_ready("baseline_v1").await;
    let response = app.clone().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    state
        .health_registry
        .set_unhealthy(components::MODEL, "runtime lost")
        .await;
    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_engine_metrics() {
    let (app, _state) = setup_app(Arc::new(MemoryAuditSink::new()), false).await;

    let response = app
        .clone()
        .oneshot(predict_request(json!({"a": 5.0, "b": 0.5})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("rul_engine_decisions_total"));
    assert!(text.contains("rul_engine_inference_latency_seconds_bucket"));
}
