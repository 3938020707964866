//! Prediction adapter over the externally fitted scaler and regressor

pub(crate) mod inference;
mod linear;
mod model;
mod scaler;

pub use inference::OnnxRegressor;
pub use linear::LinearRegressor;
pub use model::{ArtifactModel, Regressor};
pub use scaler::{ScalerDocument, StandardScaler};

use crate::models::OrderedFeatures;
use std::sync::Arc;

/// Failures raised by the injected model
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("model expects {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("model produced a non-finite estimate: {0}")]
    NonFiniteEstimate(f64),
    #[error("model inference failed: {0}")]
    Runtime(String),
}

/// Injected scale/predict capability
///
/// Implementations hold parameters frozen at training time; neither
/// operation may mutate them.
pub trait RulModel: Send + Sync {
    /// Apply the fitted feature transform
    fn scale(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError>;

    /// Produce a point RUL estimate from scaled features
    fn predict(&self, scaled: &[f64]) -> Result<f64, PredictionError>;
}

/// Stateless pass-through: scale, then predict, in feature order
#[derive(Clone)]
pub struct PredictionAdapter {
    model: Arc<dyn RulModel>,
}

impl PredictionAdapter {
    pub fn new(model: Arc<dyn RulModel>) -> Self {
        Self { model }
    }

    pub fn predict(&self, features: &OrderedFeatures) -> Result<f64, PredictionError> {
        let scaled = self.model.scale(features.values())?;
        let estimate = self.model.predict(&scaled)?;
        if !estimate.is_finite() {
            return Err(PredictionError::NonFiniteEstimate(estimate));
        }
        Ok(estimate)
    }
}
