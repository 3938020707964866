//! ONNX regressor inference using tract
//!
//! Runs an exported regression graph over already-scaled features. The graph
//! is optimized once at load time and shared read-only afterwards.

use super::PredictionError;
use anyhow::{Context, Result};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning (5ms target)
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Regressor backed by an ONNX graph with input shape `[1, num_features]`
pub struct OnnxRegressor {
    model: TractModel,
    num_features: usize,
}

impl OnnxRegressor {
    /// Parse and optimize an ONNX model from bytes
    pub fn new(model_bytes: &[u8], num_features: usize) -> Result<Self> {
        let model = Self::load_model(model_bytes, num_features)?;
        Ok(Self {
            model,
            num_features,
        })
    }

    fn load_model(model_bytes: &[u8], num_features: usize) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, num_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    fn features_to_tensor(&self, scaled: &[f64]) -> Result<Tensor> {
        let data: Vec<f32> = scaled.iter().map(|v| *v as f32).collect();
        let array = tract_ndarray::Array2::from_shape_vec((1, self.num_features), data)
            .context("Failed to shape input tensor")?;
        Ok(array.into())
    }

    fn run(&self, scaled: &[f64]) -> Result<f64> {
        let input = self.features_to_tensor(scaled)?;
        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let view = output.to_array_view::<f32>()?;
        let estimate = view.iter().next().copied().context("Model output is empty")?;
        Ok(estimate as f64)
    }

    pub fn predict(&self, scaled: &[f64]) -> Result<f64, PredictionError> {
        if scaled.len() != self.num_features {
            return Err(PredictionError::DimensionMismatch {
                expected: self.num_features,
                actual: scaled.len(),
            });
        }

        let start = Instant::now();
        let estimate = self
            .run(scaled)
            .map_err(|e| PredictionError::Runtime(format!("{:#}", e)))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(estimate)
    }
}
