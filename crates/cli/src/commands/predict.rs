//! `rulctl predict`

use anyhow::{bail, Context, Result};
use rul_core::InferenceRequest;
use std::path::Path;
use tabled::{Table, Tabled};

use super::Backend;
use crate::output::{
    color_band, format_cycles, format_flag, print_json, print_table, print_warning, OutputFormat,
};

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Parse a `name=value` pair given on the command line
pub fn parse_feature(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{}'", raw));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for {}: {}", name, e))?;
    Ok((name.to_string(), value))
}

/// Merge an optional JSON snapshot file with command-line overrides
pub fn build_request(input: Option<&Path>, features: &[(String, f64)]) -> Result<InferenceRequest> {
    let mut request = match input {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<InferenceRequest>(&raw)
                .with_context(|| format!("{} is not a JSON object of numeric features", path.display()))?
        }
        None => InferenceRequest::new(),
    };
    for (name, value) in features {
        request.insert(name.clone(), *value);
    }
    if request.is_empty() {
        bail!("no features given; use --feature NAME=VALUE or --input FILE");
    }
    Ok(request)
}

pub async fn run(backend: &Backend, request: &InferenceRequest, format: OutputFormat) -> Result<()> {
    if let Backend::Remote(_) = backend {
        // JSON has no encoding for NaN or infinity
        if let Some((name, _)) = request.iter().find(|(_, v)| !v.is_finite()) {
            bail!("feature {} is not finite and cannot be sent to the service", name);
        }
    }

    let response = backend.predict(request).await?;
    let result = &response.result;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            let rows = vec![
                FieldRow { field: "Artifact", value: result.artifact_version.clone() },
                FieldRow { field: "RUL estimate", value: format_cycles(result.point_estimate) },
                FieldRow { field: "RUL lower bound", value: format_cycles(result.lower_bound) },
                FieldRow { field: "Risk band", value: color_band(result.risk_band) },
                FieldRow { field: "Action", value: result.recommended_action.to_string() },
                FieldRow { field: "Extrapolation", value: format_flag(result.flags.extrapolation_risk) },
                FieldRow { field: "Input anomaly", value: format_flag(result.flags.input_anomaly) },
                FieldRow { field: "Timestamp", value: result.timestamp.to_rfc3339() },
            ];
            print_table(Table::new(rows));

            if result.flags.extrapolation_risk || result.flags.input_anomaly {
                print_warning("Snapshot lies outside the training distribution; treat the estimate with care");
            }
            if !response.audit_logged {
                print_warning("Decision was NOT written to the audit log");
            }
        }
    }

    Ok(())
}
