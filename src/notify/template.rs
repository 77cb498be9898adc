//! Notification texts sent to the administrator and to each recipient.

use crate::model::metadata::QuarantineMetadata;

/// Subject of every notification.
pub const SUBJECT_QUARANTINED: &str = "[QUARANTINED] Potentially Infected Email";

/// Headers from the infected message shown to recipients.
pub const RECIPIENT_HEADERS: &[&str] =
    &["Message-Id", "Sender", "From", "To", "Date", "Subject"];

const BANNER: &str = "* * * * * * * * * * * * * Virus ALERT * * * * * * * * * *";

/// Administrator alert: sender, virus, all recipients, and every header of
/// the infected message.
///
/// The "forwarded headers from" line repeats the envelope sender.
pub fn admin(metadata: &QuarantineMetadata, formatted_headers: &str) -> String {
    let sender = &metadata.envelope_sender;
    format!(
        "{BANNER}\n\
         \n\
         A potentially infected email sent to one or more of your users was detected.\n\
         \n\
         Sender: {sender}\n\
         Virus: {virus}\n\
         Recipients: {recipients}\n\
         \n\
         ----- Forwarded headers from {sender} -----\n\
         \n\
         {formatted_headers}\n",
        virus = metadata.virus_name,
        recipients = metadata.envelope_recipients.join(", "),
    )
}

/// Recipient alert: who to contact, a defanged sender, the virus, the
/// quarantine identifier, and a short header excerpt.
pub fn recipient(
    admin_address: &str,
    sanitized_sender: &str,
    virus: &str,
    quarantine_id: &str,
    formatted_headers: &str,
) -> String {
    format!(
        "{BANNER}\n\
         \n\
         A potentially infected email was sent to you. \
         The email has been quarantined for your safety.\n\
         \n\
         Contact your admin {admin_address} if you need assistance.\n\
         \n\
         Sender: {sanitized_sender}\n\
         Virus: {virus}\n\
         Quarantine ID: {quarantine_id}\n\
         \n\
         Mail-Info:\n\
         --8<--\n\
         \n\
         {formatted_headers}\n\
         --8<--\n"
    )
}
