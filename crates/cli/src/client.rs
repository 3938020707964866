//! API client for communicating with rul-service

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use rul_core::{DecisionPolicy, FeatureStats, InferenceRequest, InferenceResult, ValidationMetrics};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// Non-success answer from the service
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("rejected by service ({status}, {kind}): {message}")]
    Rejected {
        status: StatusCode,
        kind: String,
        message: String,
        /// Decision computed by the service but not audited
        unlogged: Option<Box<InferenceResult>>,
    },
    #[error("API error ({status}): {body}")]
    Api { status: StatusCode, body: String },
}

/// API client for rul-service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub async fn predict(&self, request: &InferenceRequest) -> Result<PredictResponse> {
        let url = self.base_url.join("v1/predict").context("Invalid path")?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .context("Failed to send request")?;
        Self::parse(response).await
    }

    pub async fn model(&self) -> Result<ModelInfo> {
        self.get("v1/model").await
    }

    /// Health is reported with 503 when unhealthy, so any status is parsed
    pub async fn health(&self) -> Result<(StatusCode, HealthReport)> {
        let url = self.base_url.join("healthz").context("Invalid path")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;
        let status = response.status();
        let report = response.json().await.context("Failed to parse response")?;
        Ok((status, report))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.context("Failed to parse response");
        }

        let body = response.text().await.unwrap_or_default();
        let err = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => ClientError::Rejected {
                status,
                kind: parsed.kind,
                message: parsed.error,
                unlogged: parsed.result.map(Box::new),
            },
            Err(_) => ClientError::Api { status, body },
        };
        Err(err.into())
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub result: InferenceResult,
    pub audit_logged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub artifact_version: String,
    pub feature_order: Vec<String>,
    pub training_stats: Vec<FeatureStats>,
    pub decision_policy: DecisionPolicy,
    pub validation_metrics: ValidationMetrics,
    #[serde(default)]
    pub provenance: serde_json::Value,
    pub bundle_digest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentReport {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub artifact_version: Option<String>,
    #[serde(default)]
    pub components: std::collections::BTreeMap<String, ComponentReport>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
    kind: String,
    #[serde(default)]
    result: Option<InferenceResult>,
}
