//! Versioned artifact bundle
//!
//! The bundle is produced once by the fitting pipeline and loaded once at
//! process start. After construction it is immutable and shared read-only
//! (behind an `Arc`) by every inference call.

mod documents;
mod fingerprint;
mod loader;

pub use documents::{DataFingerprint, FeatureSchemaDocument, MetricsDocument};
pub use fingerprint::{compute_checksum, BundleFingerprint};
pub use loader::{ArtifactLoader, LoadedArtifacts};

use crate::models::{DecisionPolicy, FeatureStats, ValidationMetrics};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// Artifact generation this build is compatible with
pub const EXPECTED_ARTIFACT_VERSION: &str = "baseline_v1";

/// Bundle file names
pub const FEATURE_SCHEMA_FILE: &str = "feature_schema.json";
pub const METRICS_FILE: &str = "metrics.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const ONNX_MODEL_FILE: &str = "model.onnx";

/// Load-time failures; any of these must abort startup
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("required artifact missing: {}", path.display())]
    Missing { path: PathBuf },

    #[error("{document} artifact version mismatch: expected '{expected}', found '{found}'")]
    VersionMismatch {
        document: &'static str,
        expected: String,
        found: String,
    },

    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("inconsistent artifact bundle: {0}")]
    Inconsistent(String),

    #[error("failed to load model from {}: {reason}", path.display())]
    Model { path: PathBuf, reason: String },
}

/// Descriptive metadata carried along from the fitting pipeline
#[derive(Debug, Clone, Default, Serialize)]
pub struct Provenance {
    pub dataset: Option<String>,
    pub subset: Option<String>,
    pub rul_cap: Option<f64>,
    pub model_family: Option<String>,
    pub model_name: Option<String>,
    pub target: Option<String>,
    pub data_sha256: Option<String>,
}

/// Immutable schema, statistics and policy the engine runs against
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactBundle {
    artifact_version: String,
    feature_order: Vec<String>,
    /// Aligned with `feature_order`
    training_stats: Vec<FeatureStats>,
    decision_policy: DecisionPolicy,
    validation_metrics: ValidationMetrics,
    provenance: Provenance,
    fingerprint: BundleFingerprint,
}

impl ArtifactBundle {
    /// Build a bundle from its parts, enforcing internal consistency
    pub fn new(
        artifact_version: impl Into<String>,
        features: Vec<(String, FeatureStats)>,
        decision_policy: DecisionPolicy,
        validation_metrics: ValidationMetrics,
    ) -> Result<Self, ArtifactError> {
        if features.is_empty() {
            return Err(ArtifactError::Inconsistent(
                "feature order is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (name, stats) in &features {
            if !seen.insert(name.as_str()) {
                return Err(ArtifactError::Inconsistent(format!(
                    "feature '{}' listed more than once",
                    name
                )));
            }
            validate_stats(name, stats)?;
        }

        let k = decision_policy.k;
        if !k.is_finite() || k < 0.0 {
            return Err(ArtifactError::Inconsistent(format!(
                "decision policy k must be finite and non-negative, got {}",
                k
            )));
        }
        let mae = validation_metrics.mae;
        if !mae.is_finite() || mae < 0.0 {
            return Err(ArtifactError::Inconsistent(format!(
                "validation MAE must be finite and non-negative, got {}",
                mae
            )));
        }

        let (feature_order, training_stats) = features.into_iter().unzip();
        Ok(Self {
            artifact_version: artifact_version.into(),
            feature_order,
            training_stats,
            decision_policy,
            validation_metrics,
            provenance: Provenance::default(),
            fingerprint: BundleFingerprint::default(),
        })
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: BundleFingerprint) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn artifact_version(&self) -> &str {
        &self.artifact_version
    }

    pub fn feature_order(&self) -> &[String] {
        &self.feature_order
    }

    /// Training statistics in `feature_order`
    pub fn training_stats(&self) -> &[FeatureStats] {
        &self.training_stats
    }

    pub fn decision_policy(&self) -> &DecisionPolicy {
        &self.decision_policy
    }

    pub fn validation_metrics(&self) -> &ValidationMetrics {
        &self.validation_metrics
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn fingerprint(&self) -> &BundleFingerprint {
        &self.fingerprint
    }
}

fn validate_stats(name: &str, stats: &FeatureStats) -> Result<(), ArtifactError> {
    let finite = [stats.min, stats.max, stats.mean, stats.std]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return Err(ArtifactError::Inconsistent(format!(
            "training stats for '{}' contain non-finite values",
            name
        )));
    }
    if stats.min > stats.max {
        return Err(ArtifactError::Inconsistent(format!(
            "training stats for '{}' have min {} above max {}",
            name, stats.min, stats.max
        )));
    }
    if stats.std < 0.0 {
        return Err(ArtifactError::Inconsistent(format!(
            "training stats for '{}' have negative std {}",
            name, stats.std
        )));
    }
    Ok(())
}
