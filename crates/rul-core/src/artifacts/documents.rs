//! Artifact documents written by the fitting pipeline

use crate::models::{DecisionPolicy, FeatureStats, ValidationMetrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `feature_schema.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSchemaDocument {
    pub artifact_version: String,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub subset: Option<String>,
    #[serde(default)]
    pub rul_cap: Option<f64>,
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub feature_order_enforced: bool,
    pub training_stats: BTreeMap<String, FeatureStats>,
    #[serde(default)]
    pub notes: Option<serde_json::Value>,
}

/// `metrics.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsDocument {
    pub artifact_version: String,
    #[serde(default)]
    pub model_family: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub split_strategy: Option<serde_json::Value>,
    #[serde(default)]
    pub preprocessing: Option<serde_json::Value>,
    pub validation_metrics: ValidationMetrics,
    #[serde(default)]
    pub model_coefficients: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub intercept: Option<f64>,
    pub decision_policy: DecisionPolicy,
    #[serde(default)]
    pub data_fingerprint: Option<DataFingerprint>,
}

/// Hash of the processed training data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFingerprint {
    #[serde(default)]
    pub processed_csv: Option<String>,
    pub sha256: String,
}

fn default_true() -> bool {
    true
}
