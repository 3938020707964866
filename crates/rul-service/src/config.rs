//! Service configuration

use anyhow::{Context, Result};
use rul_core::EngineConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Read from `RUL_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Port for the HTTP API, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding feature_schema.json, metrics.json and the model files
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: PathBuf,

    /// Refuse to return decisions that could not be audited
    #[serde(default)]
    pub audit_failure_fatal: bool,

    /// fsync every audit record
    #[serde(default = "default_audit_sync")]
    pub audit_sync: bool,
}

fn default_node_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("logs/inference.jsonl")
}

fn default_audit_sync() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            api_port: default_api_port(),
            artifact_dir: default_artifact_dir(),
            audit_log_path: default_audit_log_path(),
            audit_failure_fatal: false,
            audit_sync: default_audit_sync(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("RUL").try_parsing(true))
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid RUL_* configuration")
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            artifact_dir: self.artifact_dir.clone(),
            audit_log_path: self.audit_log_path.clone(),
            node_name: self.node_name.clone(),
            sync_audit_writes: self.audit_sync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("RUL")
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServiceConfig::from_source(env(&[])).unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.artifact_dir, PathBuf::from("artifacts"));
        assert!(!config.audit_failure_fatal);
        assert!(config.audit_sync);
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServiceConfig::from_source(env(&[
            ("RUL_API_PORT", "9100"),
            ("RUL_ARTIFACT_DIR", "/srv/rul/artifacts"),
            ("RUL_AUDIT_LOG_PATH", "/var/log/rul/inference.jsonl"),
            ("RUL_AUDIT_FAILURE_FATAL", "true"),
            ("RUL_NODE_NAME", "edge-7"),
        ]))
        .unwrap();

        assert_eq!(config.api_port, 9100);
        assert!(config.audit_failure_fatal);
        assert_eq!(config.node_name, "edge-7");

        let engine = config.engine_config();
        assert_eq!(engine.artifact_dir, PathBuf::from("/srv/rul/artifacts"));
        assert_eq!(engine.audit_log_path, PathBuf::from("/var/log/rul/inference.jsonl"));
    }

    #[test]
    fn test_artifact_version_not_configurable() {
        let config =
            ServiceConfig::from_source(env(&[("RUL_ARTIFACT_VERSION", "baseline_v2")])).unwrap();
        let engine = config.engine_config();

        let temp_dir = tempfile::TempDir::new().unwrap();
        let bundle = serde_json::json!({"artifact_version": "baseline_v2"}).to_string();
        std::fs::write(temp_dir.path().join("feature_schema.json"), &bundle).unwrap();
        std::fs::write(temp_dir.path().join("metrics.json"), &bundle).unwrap();
        std::fs::write(temp_dir.path().join("scaler.json"), &bundle).unwrap();

        let err = rul_core::RulEngine::from_config(&rul_core::EngineConfig {
            artifact_dir: temp_dir.path().to_path_buf(),
            audit_log_path: temp_dir.path().join("inference.jsonl"),
            ..engine
        })
        .err()
        .unwrap();
        match err {
            rul_core::EngineInitError::Artifacts(rul_core::ArtifactError::VersionMismatch {
                expected,
                found,
                ..
            }) => {
                assert_eq!(expected, rul_core::EXPECTED_ARTIFACT_VERSION);
                assert_eq!(found, "baseline_v2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_port_is_an_error() {
        assert!(ServiceConfig::from_source(env(&[("RUL_API_PORT", "not-a-port")])).is_err());
    }
}
