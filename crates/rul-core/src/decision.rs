//! Conservative lower bound and risk-band mapping
//!
//! Band thresholds are fixed policy constants. Each band owns its upper
//! boundary: a bound of exactly 60 is AMBER, exactly 30 is RED and exactly
//! 10 is CRITICAL.

use crate::models::{RecommendedAction, RiskBand};

/// Lower bounds strictly above this are GREEN
pub const GREEN_ABOVE: f64 = 60.0;
/// Lower bounds strictly above this (and at most 60) are AMBER
pub const AMBER_ABOVE: f64 = 30.0;
/// Lower bounds strictly above this (and at most 30) are RED
pub const RED_ABOVE: f64 = 10.0;

/// Outcome of the decision step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub lower_bound: f64,
    pub risk_band: RiskBand,
    pub action: RecommendedAction,
}

/// `point_estimate - k * mae`
pub fn lower_bound(point_estimate: f64, mae: f64, k: f64) -> f64 {
    point_estimate - k * mae
}

/// Map a lower bound to its band; first match in descending order wins
pub fn classify(lower_bound: f64) -> RiskBand {
    if lower_bound > GREEN_ABOVE {
        RiskBand::Green
    } else if lower_bound > AMBER_ABOVE {
        RiskBand::Amber
    } else if lower_bound > RED_ABOVE {
        RiskBand::Red
    } else {
        RiskBand::Critical
    }
}

/// Derive bound, band and action. Total over all inputs.
pub fn decide(point_estimate: f64, mae: f64, k: f64) -> Decision {
    let lower_bound = lower_bound(point_estimate, mae, k);
    let risk_band = classify(lower_bound);
    Decision {
        lower_bound,
        risk_band,
        action: risk_band.action(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_bound_subtracts_scaled_mae() {
        let decision = decide(70.0, 2.0, 1.0);
        assert_eq!(decision.lower_bound, 68.0);
        assert_eq!(decision.risk_band, RiskBand::Green);
        assert_eq!(decision.action, RecommendedAction::Continue);
    }

    #[test]
    fn test_zero_k_keeps_point_estimate() {
        assert_eq!(decide(45.0, 18.0, 0.0).lower_bound, 45.0);
    }

    #[test]
    fn test_boundaries_belong_to_lower_band() {
        assert_eq!(classify(60.0), RiskBand::Amber);
        assert_eq!(classify(30.0), RiskBand::Red);
        assert_eq!(classify(10.0), RiskBand::Critical);

        assert_eq!(decide(60.0, 0.0, 1.0).action, RecommendedAction::Inspect);
        assert_eq!(decide(30.0, 0.0, 1.0).action, RecommendedAction::ScheduleMaintenance);
        assert_eq!(decide(10.0, 0.0, 1.0).action, RecommendedAction::RemoveFromService);
    }

    #[test]
    fn test_just_above_boundaries() {
        let eps = 1e-9;
        assert_eq!(classify(60.0 + eps), RiskBand::Green);
        assert_eq!(classify(30.0 + eps), RiskBand::Amber);
        assert_eq!(classify(10.0 + eps), RiskBand::Red);
    }

    #[test]
    fn test_bands_partition_the_line() {
        // (band, lower exclusive, upper inclusive)
        let intervals = [
            (RiskBand::Green, GREEN_ABOVE, f64::INFINITY),
            (RiskBand::Amber, AMBER_ABOVE, GREEN_ABOVE),
            (RiskBand::Red, RED_ABOVE, AMBER_ABOVE),
            (RiskBand::Critical, f64::NEG_INFINITY, RED_ABOVE),
        ];
        let mut value = 200.0;
        while value > -200.0 {
            let containing: Vec<RiskBand> = intervals
                .iter()
                .filter(|(_, lo, hi)| value > *lo && value <= *hi)
                .map(|(band, _, _)| *band)
                .collect();
            assert_eq!(containing.len(), 1, "{} not in exactly one interval", value);
            assert_eq!(classify(value), containing[0], "wrong band at {}", value);
            value -= 0.25;
        }
    }

    #[test]
    fn test_extremes_are_classified() {
        assert_eq!(classify(f64::MAX), RiskBand::Green);
        assert_eq!(classify(f64::INFINITY), RiskBand::Green);
        assert_eq!(classify(f64::MIN), RiskBand::Critical);
        assert_eq!(classify(f64::NEG_INFINITY), RiskBand::Critical);
        assert_eq!(classify(-5.0), RiskBand::Critical);
    }

    #[test]
    fn test_nan_falls_through_to_critical() {
        assert_eq!(classify(f64::NAN), RiskBand::Critical);
    }
}
