//! Turbofan RUL engine CLI
//!
//! Evaluates sensor snapshots against a running rul-service or an
//! in-process engine, and inspects bundles, health and audit logs.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{audit, health, model, predict, Backend};
use std::path::PathBuf;

/// Turbofan RUL engine CLI
#[derive(Parser)]
#[command(name = "rulctl")]
#[command(author, version, about = "CLI for the Turbofan RUL Decision Engine", long_about = None)]
pub struct Cli {
    /// Service URL (can also be set via RUL_API_URL env var)
    #[arg(long, env = "RUL_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Evaluate in-process from this artifact directory instead of calling the service
    #[arg(long, global = true)]
    pub artifacts: Option<PathBuf>,

    /// Audit log used with --artifacts
    #[arg(long, global = true, default_value = "logs/inference.jsonl")]
    pub audit_log: PathBuf,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate remaining useful life for one snapshot
    Predict {
        /// Feature value as NAME=VALUE (repeatable)
        #[arg(long = "feature", short = 'F', value_parser = predict::parse_feature)]
        features: Vec<(String, f64)>,

        /// JSON file with a feature-name to value object
        #[arg(long, short)]
        input: Option<PathBuf>,
    },

    /// Show the artifact bundle in use
    Model,

    /// Show service health
    Health,

    /// Show recent records of an audit log
    Audit {
        /// Audit log path (defaults to --audit-log)
        path: Option<PathBuf>,

        /// Number of newest records to show
        #[arg(long, default_value_t = 20)]
        tail: usize,
    },
}

impl Cli {
    fn backend(&self) -> Result<Backend> {
        match &self.artifacts {
            Some(dir) => Backend::local(dir.clone(), self.audit_log.clone()),
            None => Backend::remote(&self.api_url),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(err) = run(cli).await {
        output::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Predict { features, input } => {
            let request = predict::build_request(input.as_deref(), features)?;
            let backend = cli.backend()?;
            predict::run(&backend, &request, cli.format).await?;
        }
        Commands::Model => {
            model::show_model(&cli.backend()?, cli.format).await?;
        }
        Commands::Health => {
            let client = client::ApiClient::new(&cli.api_url)?;
            health::show_health(&client, cli.format).await?;
        }
        Commands::Audit { path, tail } => {
            let path = path.as_ref().unwrap_or(&cli.audit_log);
            audit::show_records(path, *tail, cli.format)?;
        }
    }

    Ok(())
}
