//! `clamrelease`: deliver a quarantined message to its original recipients.

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info};

use clamaction::config::{ConfigSource, ServiceConfig};
use clamaction::quarantine::validate_id;
use clamaction::{logging, release};

#[derive(Parser)]
#[command(
    name = "clamrelease",
    version,
    about = "Release a quarantined message to its original recipients"
)]
struct Cli {
    /// Quarantine ID from the notification (six letters)
    #[arg(value_name = "ID", value_parser = parse_id)]
    id: String,
}

fn parse_id(raw: &str) -> Result<String, String> {
    validate_id(raw).map_err(|e| e.to_string())?;
    Ok(raw.to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let source = ConfigSource::load().context("Failed to load configuration")?;
    logging::setup(source.debug());

    let config = ServiceConfig::from_source(&source).inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;
    let transport = config.transport();

    let report = release::run(&config, &cli.id, &transport).inspect_err(|e| {
        error!(id = %cli.id, error = %e, "Release failed");
    })?;

    if !report.is_complete() {
        bail!(
            "{} of {} deliveries failed",
            report.failed.len(),
            report.failed.len() + report.delivered.len()
        );
    }

    info!(id = %cli.id, delivered = report.delivered.len(), "Release complete");
    Ok(())
}
