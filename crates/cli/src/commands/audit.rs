//! `rulctl audit`: inspect a JSONL audit log

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tabled::{Table, Tabled};

use crate::output::{color_band, format_cycles, format_flag, print_info, print_json, print_table, OutputFormat};

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Artifact")]
    artifact: String,
    #[tabled(rename = "RUL")]
    rul_pred: String,
    #[tabled(rename = "Lower")]
    rul_lower: String,
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Flagged")]
    flagged: String,
}

/// Show the newest `tail` records of an audit log
pub fn show_records(path: &Path, tail: usize, format: OutputFormat) -> Result<()> {
    let records = rul_core::audit::read_records(path)
        .with_context(|| format!("Failed to read audit log {}", path.display()))?;
    let start = records.len().saturating_sub(tail);
    let recent = &records[start..];

    match format {
        OutputFormat::Json => print_json(recent)?,
        OutputFormat::Table => {
            if recent.is_empty() {
                print_info("Audit log is empty");
                return Ok(());
            }

            let rows: Vec<RecordRow> = recent
                .iter()
                .map(|r| RecordRow {
                    timestamp: r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    artifact: r.artifact_version.clone(),
                    rul_pred: format_cycles(r.point_estimate),
                    rul_lower: format_cycles(r.lower_bound),
                    band: color_band(r.risk_band),
                    action: r.recommended_action.to_string(),
                    flagged: format_flag(r.flags.extrapolation_risk || r.flags.input_anomaly),
                })
                .collect();
            print_table(Table::new(rows));

            let mut by_band: BTreeMap<&str, usize> = BTreeMap::new();
            for record in &records {
                *by_band.entry(record.risk_band.as_str()).or_default() += 1;
            }
            let summary: Vec<String> = by_band
                .iter()
                .map(|(band, count)| format!("{} {}", band, count))
                .collect();
            println!(
                "\nShowing {} of {} records ({})",
                recent.len(),
                records.len(),
                summary.join(", ")
            );
        }
    }

    Ok(())
}
