//! Scaler + regressor pair loaded from the artifact bundle

use super::inference::OnnxRegressor;
use super::linear::LinearRegressor;
use super::scaler::StandardScaler;
use super::{PredictionError, RulModel};

/// Concrete regressor behind the bundle model
pub enum Regressor {
    Linear(LinearRegressor),
    Onnx(OnnxRegressor),
}

impl Regressor {
    pub fn kind(&self) -> &'static str {
        match self {
            Regressor::Linear(_) => "linear",
            Regressor::Onnx(_) => "onnx",
        }
    }
}

/// Fitted scaler followed by the fitted regressor
pub struct ArtifactModel {
    scaler: StandardScaler,
    regressor: Regressor,
}

impl ArtifactModel {
    pub fn new(scaler: StandardScaler, regressor: Regressor) -> Self {
        Self { scaler, regressor }
    }

    pub fn regressor_kind(&self) -> &'static str {
        self.regressor.kind()
    }
}

impl RulModel for ArtifactModel {
    fn scale(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        self.scaler.transform(features)
    }

    fn predict(&self, scaled: &[f64]) -> Result<f64, PredictionError> {
        match &self.regressor {
            Regressor::Linear(linear) => linear.predict(scaled),
            Regressor::Onnx(onnx) => onnx.predict(scaled),
        }
    }
}
