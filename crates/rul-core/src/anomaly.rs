//! Extrapolation and outlier detection against training statistics
//!
//! Flags are advisory only: a flagged snapshot still gets a prediction and a
//! decision. Both flags are OR-reduced over every feature.

use crate::models::{FeatureStats, OrderedFeatures};

/// Default z-score threshold (3 sigma)
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Detects values outside the training range or far from the training mean
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    /// Number of standard deviations to consider an outlier
    pub z_threshold: f64,
}

impl AnomalyDetector {
    pub fn new(z_threshold: f64) -> Self {
        Self { z_threshold }
    }

    /// Check every feature against its training statistics
    ///
    /// `stats` must be aligned with the feature order `features` was
    /// validated against.
    pub fn detect(&self, features: &OrderedFeatures, stats: &[FeatureStats]) -> AnomalyReport {
        let mut report = AnomalyReport::default();

        for (index, (value, stats)) in features.values().iter().zip(stats).enumerate() {
            let out_of_range = *value < stats.min || *value > stats.max;

            // Zero-variance features have no meaningful z-score and never flag
            let z_score = (stats.std > 0.0).then(|| (value - stats.mean) / stats.std);
            let outlier = z_score.map_or(false, |z| z.abs() > self.z_threshold);

            report.extrapolation_risk |= out_of_range;
            report.input_anomaly |= outlier;

            if out_of_range || outlier {
                report.deviations.push(FeatureDeviation {
                    index,
                    value: *value,
                    z_score,
                    out_of_range,
                    outlier,
                });
            }
        }

        report
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DEFAULT_Z_THRESHOLD)
    }
}

/// Result of anomaly detection for one snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnomalyReport {
    /// Some value lies outside the range observed in training
    pub extrapolation_risk: bool,
    /// Some value lies more than the threshold away from the training mean
    pub input_anomaly: bool,
    /// Offending features only
    pub deviations: Vec<FeatureDeviation>,
}

/// Details for one flagged feature
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDeviation {
    /// Position in the feature order
    pub index: usize,
    pub value: f64,
    pub z_score: Option<f64>,
    pub out_of_range: bool,
    pub outlier: bool,
}
