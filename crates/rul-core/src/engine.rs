//! RUL decision engine
//!
//! Ties the pipeline together for one snapshot:
//! validate -> detect -> predict -> decide -> audit.
//! Every step is synchronous; the artifact bundle is shared read-only and
//! the only side effect is the audit append.

use crate::anomaly::AnomalyDetector;
use crate::artifacts::{ArtifactBundle, ArtifactError, ArtifactLoader};
use crate::audit::{AuditError, AuditSink, JsonlAuditLog};
use crate::decision;
use crate::models::{InferenceRequest, InferenceResult, ResultFlags};
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::predictor::{PredictionAdapter, PredictionError, RulModel};
use crate::schema::{self, SchemaError};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Where the engine finds its artifacts and writes its audit log
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub artifact_dir: PathBuf,
    pub audit_log_path: PathBuf,
    pub node_name: String,
    /// fsync each audit record
    pub sync_audit_writes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("artifacts"),
            audit_log_path: PathBuf::from("logs/inference.jsonl"),
            node_name: "local".to_string(),
            sync_audit_writes: true,
        }
    }
}

/// Startup failures; the engine must not serve after any of these
#[derive(Debug, thiserror::Error)]
pub enum EngineInitError {
    #[error(transparent)]
    Artifacts(#[from] ArtifactError),
    #[error("failed to open audit log: {0}")]
    Audit(#[from] AuditError),
}

/// Per-request failures
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    /// The decision was computed but could not be logged
    #[error("decision computed but not written to audit log: {source}")]
    Audit {
        result: Box<InferenceResult>,
        #[source]
        source: AuditError,
    },
}

impl InferenceError {
    /// The valid-but-unlogged decision carried by an audit failure
    pub fn unlogged_result(&self) -> Option<&InferenceResult> {
        match self {
            InferenceError::Audit { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Single-snapshot RUL decision engine
pub struct RulEngine {
    bundle: Arc<ArtifactBundle>,
    adapter: PredictionAdapter,
    detector: AnomalyDetector,
    audit: Arc<dyn AuditSink>,
    metrics: EngineMetrics,
    logger: StructuredLogger,
}

impl RulEngine {
    pub fn new(
        bundle: Arc<ArtifactBundle>,
        model: Arc<dyn RulModel>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            bundle,
            adapter: PredictionAdapter::new(model),
            detector: AnomalyDetector::default(),
            audit,
            metrics: EngineMetrics::new(),
            logger: StructuredLogger::new("local"),
        }
    }

    /// Load artifacts and open the audit log described by `config`
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineInitError> {
        let loaded = ArtifactLoader::new(&config.artifact_dir).load()?;

        let mut audit_log = JsonlAuditLog::open(&config.audit_log_path)?;
        if !config.sync_audit_writes {
            audit_log = audit_log.without_sync();
        }

        let regressor = loaded.model.regressor_kind();
        let logger = StructuredLogger::new(&config.node_name);
        logger.log_artifacts_loaded(&loaded.bundle, regressor);

        let engine = Self::new(
            Arc::new(loaded.bundle),
            Arc::new(loaded.model),
            Arc::new(audit_log),
        )
        .with_logger(logger);
        engine
            .metrics
            .set_artifact_version(engine.bundle.artifact_version(), regressor);

        Ok(engine)
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn bundle(&self) -> &Arc<ArtifactBundle> {
        &self.bundle
    }

    /// Run the full pipeline and append the result to the audit log
    ///
    /// If only the audit append fails, the computed result is returned inside
    /// `InferenceError::Audit` so the caller can retry [`RulEngine::record`]
    /// or accept an unlogged decision.
    pub fn predict_rul(&self, request: &InferenceRequest) -> Result<InferenceResult, InferenceError> {
        let result = self.evaluate(request)?;
        match self.record(&result) {
            Ok(()) => Ok(result),
            Err(source) => Err(InferenceError::Audit {
                result: Box::new(result),
                source,
            }),
        }
    }

    /// Run validate, detect, predict and decide without touching the audit log
    pub fn evaluate(&self, request: &InferenceRequest) -> Result<InferenceResult, InferenceError> {
        let start = Instant::now();
        let timestamp = Utc::now();

        let features = match schema::validate(request, self.bundle.feature_order()) {
            Ok(features) => features,
            Err(err) => {
                self.metrics.inc_schema_rejection(err.kind());
                self.logger.log_input_rejected(&err);
                return Err(err.into());
            }
        };

        let report = self.detector.detect(&features, self.bundle.training_stats());

        let point_estimate = match self.adapter.predict(&features) {
            Ok(estimate) => estimate,
            Err(err) => {
                self.metrics.inc_prediction_errors();
                self.logger.log_prediction_failed(&err.to_string());
                return Err(err.into());
            }
        };

        let decision = decision::decide(
            point_estimate,
            self.bundle.validation_metrics().mae,
            self.bundle.decision_policy().k,
        );

        let result = InferenceResult {
            timestamp,
            artifact_version: self.bundle.artifact_version().to_string(),
            point_estimate,
            lower_bound: decision.lower_bound,
            risk_band: decision.risk_band,
            recommended_action: decision.action,
            flags: ResultFlags {
                schema_error: false,
                extrapolation_risk: report.extrapolation_risk,
                input_anomaly: report.input_anomaly,
            },
        };

        let flagged: Vec<&str> = report
            .deviations
            .iter()
            .map(|d| self.bundle.feature_order()[d.index].as_str())
            .collect();

        self.metrics.observe_inference_latency(start.elapsed().as_secs_f64());
        self.metrics.record_decision(&result);
        self.logger.log_decision(&result, &flagged);

        Ok(result)
    }

    /// Append an already computed result to the audit log
    pub fn record(&self, result: &InferenceResult) -> Result<(), AuditError> {
        self.audit.record(result).map_err(|err| {
            self.metrics.inc_audit_failures();
            self.logger.log_audit_failure(result, &err.to_string());
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::models::{DecisionPolicy, FeatureStats, RecommendedAction, RiskBand, ValidationMetrics};

    /// Ignores the scaled input and returns a fixed estimate
    struct FixedModel(f64);

    impl RulModel for FixedModel {
        fn scale(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
            Ok(features.to_vec())
        }

        fn predict(&self, _scaled: &[f64]) -> Result<f64, PredictionError> {
            Ok(self.0)
        }
    }

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn record(&self, _result: &InferenceResult) -> Result<(), AuditError> {
            Err(AuditError::Poisoned)
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

    fn request(a: f64, b: f64) -> InferenceRequest {
        let mut request = InferenceRequest::new();
        request.insert("a".to_string(), a);
        request.insert("b".to_string(), b);
        request
    }

    #[test]
    fn test_nominal_snapshot_continues() {
        let sink = Arc::new(MemoryAuditSink::new());
        let engine = RulEngine::new(bundle(), Arc::new(FixedModel(70.0)), sink.clone());

        let result = engine.predict_rul(&request(5.0, 0.5)).unwrap();
        assert_eq!(result.point_estimate, 70.0);
        assert_eq!(result.lower_bound, 68.0);
        assert_eq!(result.risk_band, RiskBand::Green);
        assert_eq!(result.recommended_action, RecommendedAction::Continue);
        assert_eq!(result.flags, ResultFlags::default());
        assert_eq!(result.artifact_version, "baseline_v1");

        assert_eq!(sink.records(), vec![result]);
    }

    #[test]
    fn test_flagged_snapshot_still_decided() {
        let sink = Arc::new(MemoryAuditSink::new());
        let engine = RulEngine::new(bundle(), Arc::new(FixedModel(25.0)), sink.clone());

        let result = engine.predict_rul(&request(50.0, 0.5)).unwrap();
        assert!(result.flags.extrapolation_risk);
        assert!(result.flags.input_anomaly);
        assert!(!result.flags.schema_error);
        assert_eq!(result.risk_band, RiskBand::Red);
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn test_schema_error_not_audited() {
        let sink = Arc::new(MemoryAuditSink::new());
        let engine = RulEngine::new(bundle(), Arc::new(FixedModel(70.0)), sink.clone());

        let mut bad = request(5.0, 0.5);
        bad.remove("b");
        let err = engine.predict_rul(&bad).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::Schema(SchemaError::Missing(ref f)) if f == &["b".to_string()]
        ));
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_audit_failure_keeps_result() {
        let engine = RulEngine::new(bundle(), Arc::new(FixedModel(40.0)), Arc::new(FailingSink));

        let err = engine.predict_rul(&request(5.0, 0.5)).unwrap_err();
        let result = err.unlogged_result().expect("decision should survive audit failure");
        assert_eq!(result.lower_bound, 38.0);
        assert_eq!(result.risk_band, RiskBand::Amber);
        assert!(matches!(err, InferenceError::Audit { .. }));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let engine = RulEngine::new(
            bundle(),
            Arc::new(FixedModel(12.0)),
            Arc::new(MemoryAuditSink::new()),
        );
        let first = engine.evaluate(&request(3.0, 0.4)).unwrap();
        let second = engine.evaluate(&request(3.0, 0.4)).unwrap();
        assert_eq!(first.point_estimate, second.point_estimate);
        assert_eq!(first.lower_bound, second.lower_bound);
        assert_eq!(first.risk_band, second.risk_band);
        assert_eq!(first.recommended_action, second.recommended_action);
        assert_eq!(first.risk_band, RiskBand::Critical);
    }

    #[test]
    fn test_non_finite_model_output_is_an_error() {
        let sink = Arc::new(MemoryAuditSink::new());
        let engine = RulEngine::new(bundle(), Arc::new(FixedModel(f64::INFINITY)), sink.clone());
        let err = engine.predict_rul(&request(5.0, 0.5)).unwrap_err();
        assert!(matches!(err, InferenceError::Prediction(_)));
        assert!(sink.records().is_empty());
    }
}
