//! Input schema enforcement
//!
//! A snapshot must carry exactly the bundle's features with finite values.
//! Checks run in a fixed precedence (missing, then unexpected, then
//! non-finite) and stop at the first failing check type. Each error lists
//! every feature that failed that check, not just the first one.

use crate::models::{InferenceRequest, OrderedFeatures};
use std::fmt;

/// Per-request schema rejection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Required features absent from the request, in feature order
    #[error("missing required features: {}", FeatureList(.0))]
    Missing(Vec<String>),
    /// Keys not part of the feature schema, sorted by name
    #[error("unexpected extra features: {}", FeatureList(.0))]
    Unexpected(Vec<String>),
    /// Features whose value is NaN or infinite, in feature order
    #[error("non-finite values for features: {}", FeatureList(.0))]
    NonFinite(Vec<String>),
}

impl SchemaError {
    /// Stable identifier for the failed check
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaError::Missing(_) => "missing",
            SchemaError::Unexpected(_) => "unexpected",
            SchemaError::NonFinite(_) => "non_finite",
        }
    }

    pub fn features(&self) -> &[String] {
        match self {
            SchemaError::Missing(f) | SchemaError::Unexpected(f) | SchemaError::NonFinite(f) => f,
        }
    }
}

struct FeatureList<'a>(&'a [String]);

impl fmt::Display for FeatureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// Validate a snapshot and lay its values out in `feature_order`
pub fn validate(
    request: &InferenceRequest,
    feature_order: &[String],
) -> Result<OrderedFeatures, SchemaError> {
    let missing: Vec<String> = feature_order
        .iter()
        .filter(|name| !request.contains_key(name.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::Missing(missing));
    }

    // BTreeMap keys iterate sorted
    let unexpected: Vec<String> = request
        .keys()
        .filter(|key| !feature_order.contains(key))
        .cloned()
        .collect();
    if !unexpected.is_empty() {
        return Err(SchemaError::Unexpected(unexpected));
    }

    let mut values = Vec::with_capacity(feature_order.len());
    let mut non_finite = Vec::new();
    for name in feature_order {
        let value = request[name.as_str()];
        if !value.is_finite() {
            non_finite.push(name.clone());
        }
        values.push(value);
    }
    if !non_finite.is_empty() {
        return Err(SchemaError::NonFinite(non_finite));
    }

    Ok(OrderedFeatures::new(values))
}
