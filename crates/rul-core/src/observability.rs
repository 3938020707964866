//! Observability infrastructure for the RUL engine
//!
//! Provides:
//! - Prometheus metrics (inference latency, decisions by band, rejections, flags)
//! - Structured JSON logging with tracing

use crate::artifacts::ArtifactBundle;
use crate::models::InferenceResult;
use crate::schema::SchemaError;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct EngineMetricsInner {
    inference_latency_seconds: Histogram,
    decisions: IntCounterVec,
    schema_rejections: IntCounterVec,
    prediction_errors: IntCounter,
    extrapolation_flags: IntCounter,
    anomaly_flags: IntCounter,
    audit_failures: IntCounter,
    artifact_version_info: GaugeVec,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            inference_latency_seconds: register_histogram!(
                "rul_engine_inference_latency_seconds",
                "Time spent validating, predicting and deciding for one snapshot",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register inference_latency_seconds"),

            decisions: register_int_counter_vec!(
                "rul_engine_decisions_total",
                "Decisions issued, by risk band",
                &["risk_band"]
            )
            .expect("Failed to register decisions_total"),

            schema_rejections: register_int_counter_vec!(
                "rul_engine_schema_rejections_total",
                "Snapshots rejected by input validation, by failed check",
                &["kind"]
            )
            .expect("Failed to register schema_rejections_total"),

            prediction_errors: register_int_counter!(
                "rul_engine_prediction_errors_total",
                "Total number of model failures"
            )
            .expect("Failed to register prediction_errors_total"),

            extrapolation_flags: register_int_counter!(
                "rul_engine_extrapolation_flags_total",
                "Decisions made on inputs outside the training range"
            )
            .expect("Failed to register extrapolation_flags_total"),

            anomaly_flags: register_int_counter!(
                "rul_engine_input_anomaly_flags_total",
                "Decisions made on inputs beyond the z-score threshold"
            )
            .expect("Failed to register input_anomaly_flags_total"),

            audit_failures: register_int_counter!(
                "rul_engine_audit_failures_total",
                "Decisions that could not be written to the audit log"
            )
            .expect("Failed to register audit_failures_total"),

            artifact_version_info: register_gauge_vec!(
                "rul_engine_artifact_version_info",
                "Information about the loaded artifact bundle",
                &["version", "regressor"]
            )
            .expect("Failed to register artifact_version_info"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    pub fn observe_inference_latency(&self, duration_secs: f64) {
        self.inner().inference_latency_seconds.observe(duration_secs);
    }

    /// Count a decision and its advisory flags
    pub fn record_decision(&self, result: &InferenceResult) {
        let inner = self.inner();
        inner
            .decisions
            .with_label_values(&[result.risk_band.as_str()])
            .inc();
        if result.flags.extrapolation_risk {
            inner.extrapolation_flags.inc();
        }
        if result.flags.input_anomaly {
            inner.anomaly_flags.inc();
        }
    }

    pub fn inc_schema_rejection(&self, kind: &str) {
        self.inner().schema_rejections.with_label_values(&[kind]).inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    pub fn inc_audit_failures(&self) {
        self.inner().audit_failures.inc();
    }

    /// Update artifact version info
    pub fn set_artifact_version(&self, version: &str, regressor: &str) {
        self.inner().artifact_version_info.reset();
        self.inner()
            .artifact_version_info
            .with_label_values(&[version, regressor])
            .set(1.0);
    }
}

/// Structured logger for engine events
///
/// Provides consistent JSON-formatted logging for decisions, rejections,
/// and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    /// Log a decision; flagged inputs are logged at warn level
    pub fn log_decision(&self, result: &InferenceResult, flagged_features: &[&str]) {
        if result.flags.extrapolation_risk || result.flags.input_anomaly {
            warn!(
                event = "rul_decision",
                node = %self.node_name,
                artifact_version = %result.artifact_version,
                rul_pred = result.point_estimate,
                rul_lower = result.lower_bound,
                risk_band = %result.risk_band,
                action = %result.recommended_action,
                extrapolation_risk = result.flags.extrapolation_risk,
                input_anomaly = result.flags.input_anomaly,
                flagged_features = ?flagged_features,
                "RUL decision issued on flagged input"
            );
        } else {
            info!(
                event = "rul_decision",
                node = %self.node_name,
                artifact_version = %result.artifact_version,
                rul_pred = result.point_estimate,
                rul_lower = result.lower_bound,
                risk_band = %result.risk_band,
                action = %result.recommended_action,
                "RUL decision issued"
            );
        }
    }

    /// Log a snapshot rejected by input validation
    pub fn log_input_rejected(&self, err: &SchemaError) {
        warn!(
            event = "input_rejected",
            node = %self.node_name,
            kind = err.kind(),
            features = ?err.features(),
            "Snapshot rejected: {}",
            err
        );
    }

    /// Log a model failure
    pub fn log_prediction_failed(&self, reason: &str) {
        error!(
            event = "prediction_failed",
            node = %self.node_name,
            reason = %reason,
            "Model failed to produce an estimate"
        );
    }

    /// Log a decision that could not be audited
    pub fn log_audit_failure(&self, result: &InferenceResult, reason: &str) {
        error!(
            event = "audit_write_failed",
            node = %self.node_name,
            timestamp = %result.timestamp,
            risk_band = %result.risk_band,
            reason = %reason,
            "Failed to append decision to audit log"
        );
    }

    /// Log the loaded artifact bundle
    pub fn log_artifacts_loaded(&self, bundle: &ArtifactBundle, regressor: &str) {
        info!(
            event = "artifacts_loaded",
            node = %self.node_name,
            artifact_version = %bundle.artifact_version(),
            features = ?bundle.feature_order(),
            regressor = %regressor,
            mae = bundle.validation_metrics().mae,
            k = bundle.decision_policy().k,
            bundle_digest = %bundle.fingerprint().digest(),
            "Artifact bundle ready"
        );
    }

    /// Log engine startup
    pub fn log_startup(&self, version: &str, artifact_version: &str) {
        info!(
            event = "engine_started",
            node = %self.node_name,
            engine_version = %version,
            artifact_version = %artifact_version,
            "RUL engine started"
        );
    }

    /// Log engine shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "engine_shutdown",
            node = %self.node_name,
            reason = %reason,
            "RUL engine shutting down"
        );
    }
}
