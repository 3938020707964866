//! Core data models for the RUL decision engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Single engine snapshot: sensor name to reading
pub type InferenceRequest = BTreeMap<String, f64>;

/// Training-split statistics for one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

/// Validation metrics computed once at training time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Conservative-bound policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    /// Multiplier applied to validation MAE
    pub k: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound_method: Option<String>,
}

/// Feature values in the bundle's `feature_order`
///
/// Only produced by the input validator, so the positional layout always
/// matches the artifact bundle it was validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedFeatures {
    values: Vec<f64>,
}

impl OrderedFeatures {
    pub(crate) fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Risk band derived from the conservative lower bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskBand {
    Green,
    Amber,
    Red,
    Critical,
}

impl RiskBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Green => "GREEN",
            RiskBand::Amber => "AMBER",
            RiskBand::Red => "RED",
            RiskBand::Critical => "CRITICAL",
        }
    }

    /// Operational action paired with this band
    pub fn action(&self) -> RecommendedAction {
        match self {
            RiskBand::Green => RecommendedAction::Continue,
            RiskBand::Amber => RecommendedAction::Inspect,
            RiskBand::Red => RecommendedAction::ScheduleMaintenance,
            RiskBand::Critical => RecommendedAction::RemoveFromService,
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational decision for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    Continue,
    Inspect,
    ScheduleMaintenance,
    RemoveFromService,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::Continue => "CONTINUE",
            RecommendedAction::Inspect => "INSPECT",
            RecommendedAction::ScheduleMaintenance => "SCHEDULE_MAINTENANCE",
            RecommendedAction::RemoveFromService => "REMOVE_FROM_SERVICE",
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory flags attached to every result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFlags {
    pub schema_error: bool,
    pub extrapolation_risk: bool,
    pub input_anomaly: bool,
}

/// Outcome of one inference call, as returned and as written to the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub timestamp: DateTime<Utc>,
    pub artifact_version: String,
    #[serde(rename = "rul_pred")]
    pub point_estimate: f64,
    #[serde(rename = "rul_lower")]
    pub lower_bound: f64,
    pub risk_band: RiskBand,
    pub recommended_action: RecommendedAction,
    pub flags: ResultFlags,
}
