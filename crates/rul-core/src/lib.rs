//! Remaining-useful-life decision engine for turbofan engines
//!
//! This crate provides the core functionality for:
//! - Loading and version-checking the fitted artifact bundle
//! - Strict validation of sensor snapshots against the feature schema
//! - Extrapolation and outlier flags from training statistics
//! - RUL prediction through an injected scaler and regressor
//! - Conservative lower bound, risk band and recommended action
//! - Append-only JSONL audit logging
//! - Health checks and observability

pub mod anomaly;
pub mod artifacts;
pub mod audit;
pub mod decision;
pub mod engine;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod schema;

pub use artifacts::{ArtifactBundle, ArtifactError, ArtifactLoader, EXPECTED_ARTIFACT_VERSION};
pub use audit::{AuditError, AuditSink, JsonlAuditLog, MemoryAuditSink};
pub use engine::{EngineConfig, EngineInitError, InferenceError, RulEngine};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
pub use predictor::{PredictionAdapter, PredictionError, RulModel};
pub use schema::SchemaError;
