//! Frozen feature standardization
//!
//! Applies the mean/scale pairs fitted on the training split. Parameters are
//! read once from the artifact bundle and never re-derived at inference time.

use super::PredictionError;
use serde::{Deserialize, Serialize};

/// On-disk form of the fitted scaler (`scaler.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_version: Option<String>,
    /// Feature names in the order the scaler was fitted on
    pub features: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Standard-score transform: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler, rejecting shape mismatches and unusable scale factors
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        if mean.len() != scale.len() {
            return Err(format!(
                "scaler has {} means but {} scale factors",
                mean.len(),
                scale.len()
            ));
        }
        if let Some(idx) = mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("scaler mean at position {} is not finite", idx));
        }
        if let Some(idx) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(format!(
                "scaler scale at position {} must be finite and non-zero",
                idx
            ));
        }
        Ok(Self { mean, scale })
    }

    /// Build a scaler whose feature layout must match `feature_order` exactly
    pub fn from_document(doc: &ScalerDocument, feature_order: &[String]) -> Result<Self, String> {
        if doc.features != feature_order {
            return Err(format!(
                "scaler features {:?} do not match feature order {:?}",
                doc.features, feature_order
            ));
        }
        Self::new(doc.mean.clone(), doc.scale.clone())
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if features.len() != self.mean.len() {
            return Err(PredictionError::DimensionMismatch {
                expected: self.mean.len(),
                actual: features.len(),
            });
        }
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}
