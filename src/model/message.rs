//! Outbound message types produced by [`crate::compose::builder`].

use super::header::Header;

/// A message ready to be serialized and handed to a transport.
///
/// Built fresh for every send and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Top-level header lines, each key present once.
    pub headers: Vec<Header>,
    /// Message body.
    pub body: Body,
}

/// Body of an [`OutboundMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// A single `text/plain` body.
    Plain(String),
    /// A `multipart/mixed` body (RFC 2046).
    Multipart {
        /// Boundary token, also present in the top-level `Content-Type`.
        boundary: String,
        /// Parts in emission order.
        parts: Vec<Part>,
    },
}

/// One body part of a multipart message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub headers: Vec<Header>,
    /// Raw part content, written to the wire unchanged.
    pub content: Vec<u8>,
}

impl OutboundMessage {
    /// Value of the first top-level header named `key` (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(key))
            .map(|h| h.value.as_str())
    }
}
