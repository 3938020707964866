//! HTTP API: prediction, bundle info, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use rul_core::{
    health::{ComponentStatus, HealthRegistry},
    ArtifactBundle, EngineMetrics, InferenceError, InferenceRequest, InferenceResult, RulEngine,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RulEngine>,
    pub health_registry: HealthRegistry,
    pub metrics: EngineMetrics,
    pub audit_failure_fatal: bool,
}

impl AppState {
    pub fn new(engine: Arc<RulEngine>, health_registry: HealthRegistry, metrics: EngineMetrics) -> Self {
        Self {
            engine,
            health_registry,
            metrics,
            audit_failure_fatal: false,
        }
    }

    pub fn with_audit_failure_fatal(mut self, fatal: bool) -> Self {
        self.audit_failure_fatal = fatal;
        self
    }
}

/// Successful `/v1/predict` body
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub result: InferenceResult,
    pub audit_logged: bool,
}

/// Error body shared by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// Decision that was computed but not audited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<InferenceResult>,
}

impl ErrorResponse {
    fn new(kind: &str, error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            kind: kind.to_string(),
            features: Vec::new(),
            result: None,
        }
    }
}

pub enum ApiError {
    BadRequest(JsonRejection),
    Inference(InferenceError),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(rejection) => (
                rejection.status(),
                ErrorResponse::new("invalid_body", rejection.body_text()),
            ),
            ApiError::Inference(InferenceError::Schema(err)) => {
                let mut body = ErrorResponse::new(err.kind(), &err);
                body.features = err.features().to_vec();
                (StatusCode::UNPROCESSABLE_ENTITY, body)
            }
            ApiError::Inference(InferenceError::Prediction(err)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("prediction", err),
            ),
            ApiError::Inference(err @ InferenceError::Audit { .. }) => {
                let mut body = ErrorResponse::new("audit", &err);
                body.result = err.unlogged_result().cloned();
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            ApiError::Internal(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("internal", reason),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Evaluate one snapshot
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InferenceRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) = payload.map_err(ApiError::BadRequest)?;

    // The audit append may fsync; keep it off the async workers
    let engine = state.engine.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.predict_rul(&request))
        .await
        .map_err(|e| ApiError::Internal(format!("inference task failed: {}", e)))?;

    match outcome {
        Ok(result) => {
            state.health_registry.record_model_outcome(None).await;
            state.health_registry.record_audit_outcome(None).await;
            Ok(Json(PredictResponse {
                result,
                audit_logged: true,
            }))
        }
        Err(InferenceError::Audit { result, source }) => {
            let reason = source.to_string();
            state.health_registry.record_model_outcome(None).await;
            state.health_registry.record_audit_outcome(Some(&reason)).await;
            if state.audit_failure_fatal {
                return Err(ApiError::Inference(InferenceError::Audit { result, source }));
            }
            error!(reason = %reason, "Returning decision without audit record");
            Ok(Json(PredictResponse {
                result: *result,
                audit_logged: false,
            }))
        }
        Err(InferenceError::Prediction(err)) => {
            state
                .health_registry
                .record_model_outcome(Some(&err.to_string()))
                .await;
            Err(ApiError::Inference(InferenceError::Prediction(err)))
        }
        Err(err) => Err(ApiError::Inference(err)),
    }
}

#[derive(Serialize)]
struct ModelResponse<'a> {
    #[serde(flatten)]
    bundle: &'a ArtifactBundle,
    bundle_digest: String,
}

/// Loaded artifact bundle
async fn model(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let bundle = state.engine.bundle();
    Json(ModelResponse {
        bundle: bundle.as_ref(),
        bundle_digest: bundle.fingerprint().digest(),
    })
    .into_response()
}

/// 200 while operational (degraded included), 503 otherwise
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;
    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;
    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        return ApiError::Internal(format!("failed to encode metrics: {}", e)).into_response();
    }
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/predict", post(predict))
        .route("/v1/model", get(model))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
