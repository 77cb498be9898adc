//! `clamaction`: clamsmtpd `VirusAction` entry point.
//!
//! All input arrives in environment variables; see [`clamaction::config`].

use anyhow::Context;
use clap::Parser;
use tracing::error;

use clamaction::action;
use clamaction::config::{ActionConfig, ConfigSource};
use clamaction::logging;

#[derive(Parser)]
#[command(
    name = "clamaction",
    version,
    about = "Quarantine an infected message and notify its recipients",
    after_help = "Reads EMAIL, VIRUS, RECIPIENTS, SENDER, EMAIL_ADMIN, EMAIL_SERVICE, \
                  QUARANTINE_FOLDER and optionally SMTP_HOST, SMTP_PORT, DEBUG from the \
                  environment."
)]
struct Cli {}

fn main() -> anyhow::Result<()> {
    Cli::parse();

    let source = ConfigSource::load().context("Failed to load configuration")?;
    logging::setup(source.debug());

    let result = ActionConfig::from_source(&source).and_then(|config| {
        let transport = config.service.transport();
        action::run(&config, &transport)
    });

    match result {
        Ok(report) => {
            tracing::info!(
                id = %report.quarantine_id,
                notified = report.notified.len(),
                "Quarantine complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Quarantine action failed");
            Err(e.into())
        }
    }
}
