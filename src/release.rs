//! Releasing a quarantined message to its original recipients.

use chrono::{DateTime, Local, TimeZone};
use tracing::{error, info, warn};

use crate::compose::builder::build_resent;
use crate::config::ServiceConfig;
use crate::error::{QuarantineError, Result};
use crate::model::address::EmailAddress;
use crate::model::header::Header;
use crate::parser::eml::read_eml;
use crate::quarantine::lock::EntryLock;
use crate::quarantine::{metadata, QuarantineEntry};
use crate::smtp::Transport;

/// Outcome of one release run.
#[derive(Debug, Default)]
pub struct ReleaseReport {
    pub delivered: Vec<String>,
    /// Recipients whose delivery failed, with the error.
    pub failed: Vec<(String, QuarantineError)>,
}

impl ReleaseReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deliver quarantined message `id` to each of its original recipients.
///
/// Missing or unreadable files abort the release. A failed delivery is
/// logged and the remaining recipients are still attempted; the failures are
/// collected in the report.
pub fn run(config: &ServiceConfig, id: &str, transport: &dyn Transport) -> Result<ReleaseReport> {
    let folder = &config.quarantine_folder;
    let entry = QuarantineEntry::for_id(folder, id)?;
    let _lock = EntryLock::acquire(folder, &entry.name)?;

    let record = metadata::load(&entry.sidecar)?;
    let original = read_eml(&entry.file)?;
    info!(
        id,
        virus = %record.virus_name,
        recipients = record.envelope_recipients.len(),
        "Releasing quarantined message"
    );

    let mut report = ReleaseReport::default();
    for recipient in record.envelope_recipients.iter().filter(|r| !r.is_empty()) {
        let headers = resent_headers(&config.email_service, recipient, Local::now());
        let message = build_resent(&original, &headers);

        match transport.send(&record.envelope_sender, recipient, &message) {
            Ok(()) => {
                info!(to = %recipient, "Released message delivered");
                report.delivered.push(recipient.clone());
            }
            Err(e) => {
                error!(to = %recipient, error = %e, "Release delivery failed");
                report.failed.push((recipient.clone(), e.into()));
            }
        }
    }

    Ok(report)
}

/// `Resent-*` block for one release (RFC 5322 section 3.6.6).
///
/// `Resent-Message-ID` uses the domain of `service`; without one the field
/// is left out.
pub fn resent_headers<Tz: TimeZone>(service: &str, recipient: &str, now: DateTime<Tz>) -> Vec<Header>
where
    Tz::Offset: std::fmt::Display,
{
    let service = EmailAddress::parse(service);
    let recipient = EmailAddress::parse(recipient);

    let mut headers = vec![
        Header::new("Resent-Date", now.to_rfc2822()),
        Header::new("Resent-From", service.angle()),
        Header::new("Resent-To", recipient.angle()),
    ];

    match service.domain() {
        Some(domain) => headers.push(Header::new(
            "Resent-Message-ID",
            format!("<{}@{domain}>", uuid::Uuid::new_v4()),
        )),
        None => warn!(
            service = %service.address,
            "Service address has no domain, omitting Resent-Message-ID"
        ),
    }

    headers
}
