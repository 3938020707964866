//! Artifact bundle loading and compatibility verification

use super::{
    ArtifactBundle, ArtifactError, BundleFingerprint, FeatureSchemaDocument, MetricsDocument,
    Provenance, EXPECTED_ARTIFACT_VERSION, FEATURE_SCHEMA_FILE, METRICS_FILE, ONNX_MODEL_FILE,
    SCALER_FILE,
};
use crate::predictor::{
    ArtifactModel, LinearRegressor, OnnxRegressor, Regressor, ScalerDocument, StandardScaler,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Deserialize)]
struct VersionHeader {
    artifact_version: String,
}

#[derive(Deserialize)]
struct OptionalVersionHeader {
    #[serde(default)]
    artifact_version: Option<String>,
}

/// Everything the engine needs from disk
pub struct LoadedArtifacts {
    pub bundle: ArtifactBundle,
    pub model: ArtifactModel,
}

/// Loads a bundle directory and verifies it against the expected version
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    dir: PathBuf,
    expected_version: String,
}

impl ArtifactLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            expected_version: EXPECTED_ARTIFACT_VERSION.to_string(),
        }
    }

    #[cfg(test)]
    fn with_expected_version(mut self, version: impl Into<String>) -> Self {
        self.expected_version = version.into();
        self
    }

    pub fn load(&self) -> Result<LoadedArtifacts, ArtifactError> {
        let schema_path = self.dir.join(FEATURE_SCHEMA_FILE);
        let metrics_path = self.dir.join(METRICS_FILE);
        let scaler_path = self.dir.join(SCALER_FILE);

        for path in [&schema_path, &metrics_path, &scaler_path] {
            if !path.is_file() {
                return Err(ArtifactError::Missing { path: path.clone() });
            }
        }

        let mut fingerprint = BundleFingerprint::new();
        let schema_bytes = read_recorded(&schema_path, FEATURE_SCHEMA_FILE, &mut fingerprint)?;
        let metrics_bytes = read_recorded(&metrics_path, METRICS_FILE, &mut fingerprint)?;
        let scaler_bytes = read_recorded(&scaler_path, SCALER_FILE, &mut fingerprint)?;

        // Versions are compared before the full parse so a bundle from another
        // generation reports a mismatch even when its layout changed
        let schema_header: VersionHeader = parse_document(&schema_path, &schema_bytes)?;
        self.check_version("feature schema", &schema_header.artifact_version)?;
        let metrics_header: VersionHeader = parse_document(&metrics_path, &metrics_bytes)?;
        self.check_version("metrics", &metrics_header.artifact_version)?;
        let scaler_header: OptionalVersionHeader = parse_document(&scaler_path, &scaler_bytes)?;
        if let Some(version) = &scaler_header.artifact_version {
            self.check_version("scaler", version)?;
        }

        let schema: FeatureSchemaDocument = parse_document(&schema_path, &schema_bytes)?;
        let metrics: MetricsDocument = parse_document(&metrics_path, &metrics_bytes)?;
        let scaler_doc: ScalerDocument = parse_document(&scaler_path, &scaler_bytes)?;

        if let Some(metric_features) = &metrics.features {
            if metric_features != &schema.features {
                return Err(ArtifactError::Inconsistent(format!(
                    "metrics features {:?} differ from schema features {:?}",
                    metric_features, schema.features
                )));
            }
        }

        if !schema.feature_order_enforced {
            warn!("Feature schema does not declare feature_order_enforced; enforcing anyway");
        }

        let bundle = build_bundle(&schema, &metrics)?;

        let scaler = StandardScaler::from_document(&scaler_doc, bundle.feature_order())
            .map_err(|reason| ArtifactError::Model {
                path: scaler_path.clone(),
                reason,
            })?;

        let regressor = self.load_regressor(&metrics, bundle.feature_order(), &mut fingerprint)?;
        let bundle = bundle.with_fingerprint(fingerprint);
        let model = ArtifactModel::new(scaler, regressor);

        info!(
            artifact_version = %bundle.artifact_version(),
            features = bundle.feature_order().len(),
            regressor = model.regressor_kind(),
            bundle_digest = %bundle.fingerprint().digest(),
            dir = %self.dir.display(),
            "Artifact bundle loaded"
        );

        Ok(LoadedArtifacts { bundle, model })
    }

    fn check_version(&self, document: &'static str, found: &str) -> Result<(), ArtifactError> {
        if found != self.expected_version {
            return Err(ArtifactError::VersionMismatch {
                document,
                expected: self.expected_version.clone(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// Prefer an exported ONNX graph, else rebuild OLS from recorded coefficients
    fn load_regressor(
        &self,
        metrics: &MetricsDocument,
        feature_order: &[String],
        fingerprint: &mut BundleFingerprint,
    ) -> Result<Regressor, ArtifactError> {
        let onnx_path = self.dir.join(ONNX_MODEL_FILE);
        if onnx_path.is_file() {
            let bytes = read_bytes(&onnx_path)?;
            fingerprint.record(ONNX_MODEL_FILE, &bytes);
            let onnx = OnnxRegressor::new(&bytes, feature_order.len()).map_err(|e| {
                ArtifactError::Model {
                    path: onnx_path.clone(),
                    reason: format!("{:#}", e),
                }
            })?;
            return Ok(Regressor::Onnx(onnx));
        }

        match (&metrics.model_coefficients, metrics.intercept) {
            (Some(coefficients), Some(intercept)) => {
                LinearRegressor::from_named(coefficients, intercept, feature_order)
                    .map(Regressor::Linear)
                    .map_err(|reason| ArtifactError::Model {
                        path: self.dir.join(METRICS_FILE),
                        reason,
                    })
            }
            _ => Err(ArtifactError::Missing { path: onnx_path }),
        }
    }
}

fn build_bundle(
    schema: &FeatureSchemaDocument,
    metrics: &MetricsDocument,
) -> Result<ArtifactBundle, ArtifactError> {
    let mut seen = HashSet::with_capacity(schema.features.len());
    if let Some(duplicate) = schema.features.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(ArtifactError::Inconsistent(format!(
            "feature '{}' listed more than once",
            duplicate
        )));
    }

    let mut features = Vec::with_capacity(schema.features.len());
    for name in &schema.features {
        let stats = schema.training_stats.get(name).ok_or_else(|| {
            ArtifactError::Inconsistent(format!("no training stats for feature '{}'", name))
        })?;
        features.push((name.clone(), *stats));
    }
    if schema.training_stats.len() != schema.features.len() {
        let unknown: Vec<&String> = schema
            .training_stats
            .keys()
            .filter(|k| !schema.features.contains(k))
            .collect();
        return Err(ArtifactError::Inconsistent(format!(
            "training stats recorded for unknown features {:?}",
            unknown
        )));
    }

    let provenance = Provenance {
        dataset: schema.dataset.clone(),
        subset: schema.subset.clone(),
        rul_cap: schema.rul_cap,
        model_family: metrics.model_family.clone(),
        model_name: metrics.model_name.clone(),
        target: metrics.target.clone(),
        data_sha256: metrics.data_fingerprint.as_ref().map(|f| f.sha256.clone()),
    };

    Ok(ArtifactBundle::new(
        schema.artifact_version.clone(),
        features,
        metrics.decision_policy.clone(),
        metrics.validation_metrics,
    )?
    .with_provenance(provenance))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ArtifactError::Missing {
            path: path.to_path_buf(),
        },
        _ => ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn read_recorded(
    path: &Path,
    file_name: &str,
    fingerprint: &mut BundleFingerprint,
) -> Result<Vec<u8>, ArtifactError> {
    let bytes = read_bytes(path)?;
    fingerprint.record(file_name, &bytes);
    Ok(bytes)
}

fn parse_document<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
