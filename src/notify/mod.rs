//! Notification messages for a quarantined email.

pub mod template;

use tracing::debug;

use crate::compose::builder;
use crate::compose::defang::defang;
use crate::model::header::Header;
use crate::model::message::OutboundMessage;
use crate::model::metadata::QuarantineMetadata;
use crate::parser::header::{format_all, format_selected};

pub use template::{RECIPIENT_HEADERS, SUBJECT_QUARANTINED};

/// Alert for the administrator, with the infected message attached as
/// `<attachment_name>.eml`.
pub fn admin_notification(
    service: &str,
    admin: &str,
    metadata: &QuarantineMetadata,
    headers: &[Header],
    original: &[u8],
    attachment_name: &str,
) -> OutboundMessage {
    debug!(to = admin, "Composing admin notification");
    let text = template::admin(metadata, &format_all(headers));
    builder::build_with_attachment(
        service,
        admin,
        SUBJECT_QUARANTINED,
        &text,
        original,
        attachment_name,
    )
}

/// Alert for one original recipient. Carries no part of the infected message
/// beyond the [`RECIPIENT_HEADERS`] excerpt.
pub fn recipient_notification(
    service: &str,
    recipient: &str,
    admin: &str,
    metadata: &QuarantineMetadata,
    headers: &[Header],
    quarantine_id: &str,
) -> OutboundMessage {
    debug!(to = recipient, "Composing recipient notification");
    let text = template::recipient(
        admin,
        &defang(&metadata.envelope_sender),
        &metadata.virus_name,
        quarantine_id,
        &format_selected(headers, RECIPIENT_HEADERS),
    );
    builder::build_plain(service, recipient, SUBJECT_QUARANTINED, &text)
}
