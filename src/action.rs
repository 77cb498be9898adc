//! The `VirusAction` pipeline: quarantine one infected message and notify
//! the administrator and every original recipient.

use tracing::{debug, info};

use crate::compose::builder::serialize;
use crate::config::ActionConfig;
use crate::error::Result;
use crate::model::metadata::QuarantineMetadata;
use crate::notify;
use crate::parser::eml::read_eml;
use crate::parser::header::parse_headers;
use crate::quarantine::lock::EntryLock;
use crate::quarantine::{metadata, store, QuarantineEntry};
use crate::smtp::Transport;

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub entry: QuarantineEntry,
    /// Identifier quoted to recipients for release.
    pub quarantine_id: String,
    /// Recipients that were sent a notification.
    pub notified: Vec<String>,
}

/// Quarantine `config.email` and send all notifications through `transport`.
///
/// Every step is fatal: the first error is returned and nothing after it
/// runs. Files already moved stay where they are.
pub fn run(config: &ActionConfig, transport: &dyn Transport) -> Result<ActionReport> {
    let folder = &config.service.quarantine_folder;
    let entry = QuarantineEntry::for_email(folder, &config.email)?;
    let _lock = EntryLock::acquire(folder, &entry.name)?;

    info!(
        virus = %config.virus,
        sender = %config.sender,
        file = %entry.file.display(),
        "Quarantining infected message"
    );
    store::store(&config.email, &entry.file)?;

    let record = QuarantineMetadata::new(&config.sender, &config.recipients, &config.virus);
    metadata::save(&entry.sidecar, &record)?;

    let original = read_eml(&entry.file)?;
    let headers = parse_headers(&original)?;
    debug!(headers = headers.len(), "Read quarantined message");

    let service = &config.service.email_service;

    let admin = notify::admin_notification(
        service,
        &config.email_admin,
        &record,
        &headers,
        &original,
        &entry.name,
    );
    transport.send(service, &config.email_admin, &serialize(&admin))?;
    info!(to = %config.email_admin, "Administrator notified");

    let quarantine_id = entry.id().to_string();
    let mut notified = Vec::with_capacity(config.recipients.len());
    for recipient in config.recipients.iter().filter(|r| !r.is_empty()) {
        let message = notify::recipient_notification(
            service,
            recipient,
            &config.email_admin,
            &record,
            &headers,
            &quarantine_id,
        );
        transport.send(service, recipient, &serialize(&message))?;
        info!(to = %recipient, "Recipient notified");
        notified.push(recipient.clone());
    }

    Ok(ActionReport {
        entry,
        quarantine_id,
        notified,
    })
}
