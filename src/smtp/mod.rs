//! SMTP delivery: one message to one recipient per session.

pub mod client;
pub mod data;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{DeliveryError, SmtpStep};
use client::SmtpClient;

/// Deadline for connecting and completing the whole dialogue.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Name sent with `EHLO`/`HELO`.
pub const DEFAULT_HELO_NAME: &str = "localhost";

/// Something that can deliver a serialized message to a single recipient.
pub trait Transport {
    fn send(
        &self,
        envelope_sender: &str,
        envelope_recipient: &str,
        message: &[u8],
    ) -> Result<(), DeliveryError>;
}

/// Plain SMTP delivery to a relay (no TLS, no AUTH).
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    pub host: String,
    pub port: u16,
    pub helo_name: String,
    pub timeout: Duration,
}

impl SmtpTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            helo_name: DEFAULT_HELO_NAME.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Transport for SmtpTransport {
    /// Run `MAIL FROM` / `RCPT TO` / `DATA` against the relay.
    ///
    /// Once the greeting has been read, `QUIT` is attempted on every path; a
    /// failing `QUIT` is only logged since the message may already be
    /// accepted. The connection is closed when the client is dropped.
    fn send(
        &self,
        envelope_sender: &str,
        envelope_recipient: &str,
        message: &[u8],
    ) -> Result<(), DeliveryError> {
        debug!(
            host = %self.host,
            port = self.port,
            recipient = envelope_recipient,
            "Starting SMTP delivery"
        );

        let mut client = SmtpClient::connect(&self.host, self.port, self.timeout)
            .map_err(DeliveryError::at(SmtpStep::Connect))?;
        client
            .read_greeting()
            .map_err(DeliveryError::at(SmtpStep::Greeting))?;

        let result = transaction(
            &mut client,
            &self.helo_name,
            envelope_sender,
            envelope_recipient,
            message,
        );

        if let Err(e) = client.quit() {
            warn!(error = %e, "SMTP QUIT failed");
        }

        if result.is_ok() {
            info!(
                recipient = envelope_recipient,
                bytes = message.len(),
                "Message delivered"
            );
        }
        result
    }
}

fn transaction(
    client: &mut SmtpClient,
    helo_name: &str,
    sender: &str,
    recipient: &str,
    message: &[u8],
) -> Result<(), DeliveryError> {
    client
        .hello(helo_name)
        .map_err(DeliveryError::at(SmtpStep::Hello))?;
    client
        .mail_from(sender)
        .map_err(DeliveryError::at(SmtpStep::MailFrom))?;
    client
        .rcpt_to(recipient)
        .map_err(DeliveryError::at(SmtpStep::RcptTo))?;
    client.data().map_err(DeliveryError::at(SmtpStep::Data))?;
    client
        .send_message(message)
        .map_err(DeliveryError::at(SmtpStep::Message))?;
    Ok(())
}

/// Deliver `message` to one recipient through `host:port` with the default
/// ten second deadline.
pub fn send(
    host: &str,
    port: u16,
    envelope_sender: &str,
    envelope_recipient: &str,
    message: &[u8],
) -> Result<(), DeliveryError> {
    SmtpTransport::new(host, port).send(envelope_sender, envelope_recipient, message)
}
