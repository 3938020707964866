//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use rul_core::RiskBand;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Pretty-print any serializable value as JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_table(mut table: tabled::Table) {
    println!("{}", table.with(tabled::settings::Style::rounded()));
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color a risk band by severity
pub fn color_band(band: RiskBand) -> String {
    let label = band.as_str();
    match band {
        RiskBand::Green => label.green().bold().to_string(),
        RiskBand::Amber => label.yellow().bold().to_string(),
        RiskBand::Red => label.red().bold().to_string(),
        RiskBand::Critical => label.on_red().white().bold().to_string(),
    }
}

/// Color a component status string
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        "unhealthy" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Render a yes/no flag, highlighting raised flags
pub fn format_flag(raised: bool) -> String {
    if raised {
        "yes".yellow().bold().to_string()
    } else {
        "no".to_string()
    }
}

/// Format cycles with one decimal
pub fn format_cycles(value: f64) -> String {
    format!("{:.1}", value)
}
