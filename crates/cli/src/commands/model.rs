//! `rulctl model`

use anyhow::Result;
use colored::Colorize;
use tabled::{Table, Tabled};

use super::Backend;
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Feature")]
    name: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Std")]
    std: String,
}

/// Show the loaded artifact bundle
pub async fn show_model(backend: &Backend, format: OutputFormat) -> Result<()> {
    let info = backend.model().await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            println!("{}", "Artifact Bundle".bold());
            println!("{}", "=".repeat(60));
            println!("Version:        {}", info.artifact_version.cyan());
            println!("Digest:         {}", info.bundle_digest);
            println!(
                "Validation:     MAE {:.2}  RMSE {:.2}  R2 {:.3}",
                info.validation_metrics.mae, info.validation_metrics.rmse, info.validation_metrics.r2
            );
            println!(
                "Lower bound:    rul_pred - {} x MAE",
                info.decision_policy.k
            );
            if let Some(name) = info.provenance.get("model_name").and_then(|v| v.as_str()) {
                println!("Model:          {}", name);
            }
            println!();

            let rows: Vec<FeatureRow> = info
                .feature_order
                .iter()
                .zip(&info.training_stats)
                .enumerate()
                .map(|(i, (name, stats))| FeatureRow {
                    position: i + 1,
                    name: name.clone(),
                    min: format!("{:.4}", stats.min),
                    max: format!("{:.4}", stats.max),
                    mean: format!("{:.4}", stats.mean),
                    std: format!("{:.4}", stats.std),
                })
                .collect();
            print_table(Table::new(rows));
            println!("\nTotal: {} features", info.feature_order.len());
        }
    }

    Ok(())
}
