//! CLI subcommands

pub mod audit;
pub mod health;
pub mod model;
pub mod predict;

use crate::client::{ApiClient, ClientError, ModelInfo, PredictResponse};
use anyhow::Result;
use rul_core::{EngineConfig, InferenceError, InferenceRequest, RulEngine};
use std::path::PathBuf;

/// Where decisions are computed
pub enum Backend {
    /// A running rul-service
    Remote(ApiClient),
    /// An engine loaded in this process
    Local(RulEngine),
}

impl Backend {
    pub fn remote(api_url: &str) -> Result<Self> {
        Ok(Backend::Remote(ApiClient::new(api_url)?))
    }

    pub fn local(artifact_dir: PathBuf, audit_log_path: PathBuf) -> Result<Self> {
        let config = EngineConfig {
            artifact_dir,
            audit_log_path,
            node_name: "rulctl".to_string(),
            ..EngineConfig::default()
        };
        Ok(Backend::Local(RulEngine::from_config(&config)?))
    }

    pub async fn predict(&self, request: &InferenceRequest) -> Result<PredictResponse> {
        match self {
            Backend::Remote(client) => match client.predict(request).await {
                Err(err) => match err.downcast::<ClientError>() {
                    Ok(ClientError::Rejected {
                        unlogged: Some(result),
                        message,
                        ..
                    }) => {
                        crate::output::print_warning(&format!("decision not audited: {}", message));
                        Ok(PredictResponse {
                            result: *result,
                            audit_logged: false,
                        })
                    }
                    Ok(other) => Err(other.into()),
                    Err(err) => Err(err),
                },
                ok => ok,
            },
            Backend::Local(engine) => match engine.predict_rul(request) {
                Ok(result) => Ok(PredictResponse {
                    result,
                    audit_logged: true,
                }),
                Err(InferenceError::Audit { result, source }) => {
                    crate::output::print_warning(&format!("decision not audited: {}", source));
                    Ok(PredictResponse {
                        result: *result,
                        audit_logged: false,
                    })
                }
                Err(err) => Err(err.into()),
            },
        }
    }

    pub async fn model(&self) -> Result<ModelInfo> {
        match self {
            Backend::Remote(client) => client.model().await,
            Backend::Local(engine) => {
                let bundle = engine.bundle();
                Ok(ModelInfo {
                    artifact_version: bundle.artifact_version().to_string(),
                    feature_order: bundle.feature_order().to_vec(),
                    training_stats: bundle.training_stats().to_vec(),
                    decision_policy: bundle.decision_policy().clone(),
                    validation_metrics: *bundle.validation_metrics(),
                    provenance: serde_json::to_value(bundle.provenance())?,
                    bundle_digest: bundle.fingerprint().digest(),
                })
            }
        }
    }
}
