//! Ordinary least squares regressor rebuilt from recorded coefficients

use super::PredictionError;
use std::collections::BTreeMap;

/// Linear model over standardized features
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegressor {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, String> {
        if coefficients.iter().any(|c| !c.is_finite()) || !intercept.is_finite() {
            return Err("linear model parameters must be finite".to_string());
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    /// Arrange a name-keyed coefficient table into `feature_order`
    pub fn from_named(
        coefficients: &BTreeMap<String, f64>,
        intercept: f64,
        feature_order: &[String],
    ) -> Result<Self, String> {
        let mut ordered = Vec::with_capacity(feature_order.len());
        for name in feature_order {
            match coefficients.get(name) {
                Some(c) => ordered.push(*c),
                None => return Err(format!("no coefficient recorded for feature '{}'", name)),
            }
        }
        if coefficients.len() != feature_order.len() {
            let unknown: Vec<&String> = coefficients
                .keys()
                .filter(|k| !feature_order.contains(k))
                .collect();
            return Err(format!("coefficients recorded for unknown features {:?}", unknown));
        }
        Self::new(ordered, intercept)
    }

    pub fn predict(&self, scaled: &[f64]) -> Result<f64, PredictionError> {
        if scaled.len() != self.coefficients.len() {
            return Err(PredictionError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: scaled.len(),
            });
        }
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(scaled)
            .map(|(c, x)| c * x)
            .sum();
        Ok(self.intercept + dot)
    }
}
