//! `rulctl health`

use anyhow::{bail, Result};
use tabled::{Table, Tabled};

use crate::client::ApiClient;
use crate::output::{color_status, print_json, print_success, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Query the service health endpoint; fails when the service is unhealthy
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let (status, report) = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            let rows: Vec<ComponentRow> = report
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(&component.status),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            print_table(Table::new(rows));

            let version = report.artifact_version.as_deref().unwrap_or("unknown");
            match report.status.as_str() {
                "healthy" => print_success(&format!("Service healthy (artifacts {})", version)),
                "degraded" => print_warning(&format!("Service degraded (artifacts {})", version)),
                _ => {}
            }
        }
    }

    if !status.is_success() {
        bail!("service reported {} ({})", report.status, status);
    }
    Ok(())
}
