//! Provenance record stored next to every quarantined message.

use chrono::{DateTime, Local, SecondsFormat, TimeZone};

/// Metadata persisted as the JSON sidecar `<quarantine file>.json`.
///
/// Written once at quarantine time and read back unchanged by the release tool.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuarantineMetadata {
    /// SMTP `MAIL FROM` of the infected message.
    pub envelope_sender: String,
    /// SMTP `RCPT TO` addresses, in the order the MTA reported them.
    pub envelope_recipients: Vec<String>,
    /// Signature name reported by the scanner.
    pub virus_name: String,
    /// RFC 3339 timestamp of the quarantine.
    pub quarantine_time: String,
}

impl QuarantineMetadata {
    /// Create a record stamped with the current local time.
    pub fn new(sender: &str, recipients: &[String], virus: &str) -> Self {
        Self::at(sender, recipients, virus, Local::now())
    }

    /// Create a record stamped with `time`.
    pub fn at<Tz: TimeZone>(
        sender: &str,
        recipients: &[String],
        virus: &str,
        time: DateTime<Tz>,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            envelope_sender: sender.to_string(),
            envelope_recipients: recipients.to_vec(),
            virus_name: virus.to_string(),
            quarantine_time: time.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
