//! RUL Service - remaining-useful-life decision API
//!
//! Loads the versioned artifact bundle once, then serves single-snapshot
//! decisions over HTTP alongside health and Prometheus endpoints.

use anyhow::{Context, Result};
use rul_core::{
    health::{components, HealthRegistry},
    observability::{EngineMetrics, StructuredLogger},
    RulEngine,
};
use rul_service::{api, config::ServiceConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting rul-service");

    let config = ServiceConfig::load()?;
    info!(
        node_name = %config.node_name,
        artifact_dir = %config.artifact_dir.display(),
        audit_log = %config.audit_log_path.display(),
        audit_failure_fatal = config.audit_failure_fatal,
        "Service configured"
    );

    // No partial startup: a bad bundle or unwritable audit log ends the process
    let engine = match RulEngine::from_config(&config.engine_config()) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            error!(error = %e, "Failed to initialize engine");
            return Err(e).context("engine initialization failed");
        }
    };
    let artifact_version = engine.bundle().artifact_version().to_string();

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL).await;
    health_registry.register(components::AUDIT_LOG).await;

    let metrics = EngineMetrics::new();

    let logger = StructuredLogger::new(&config.node_name);
    logger.log_startup(SERVICE_VERSION, &artifact_version);

    let app_state = Arc::new(
        api::AppState::new(engine, health_registry.clone(), metrics)
            .with_audit_failure_fatal(config.audit_failure_fatal),
    );

    health_registry.mark_ready(&artifact_version).await;

    let shutdown_logger = logger.clone();
    api::serve(config.api_port, app_state, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        shutdown_logger.log_shutdown("SIGINT received");
    })
    .await?;

    info!("Shutting down");
    Ok(())
}
