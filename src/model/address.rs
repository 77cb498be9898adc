//! Email address handling for envelope and `Resent-*` fields (RFC 5322 §3.4).

/// The bare mailbox of a configured or envelope address.
///
/// # Examples
/// - `"Mail Service <service@example.com>"` → `address = "service@example.com"`
/// - `"user@example.com"` → `address = "user@example.com"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Parse a single email address from a configuration or header value.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    ///
    /// Any display name is dropped. Without angle brackets the trimmed
    /// input is taken as the address.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let (Some(start), Some(end)) = (trimmed.rfind('<'), trimmed.rfind('>')) {
            if end > start {
                return Self {
                    address: trimmed[start + 1..end].trim().to_string(),
                };
            }
        }

        Self {
            address: trimmed.to_string(),
        }
    }

    /// Domain part of the address, if it has a non-empty one.
    pub fn domain(&self) -> Option<&str> {
        self.address
            .split_once('@')
            .map(|(_, domain)| domain)
            .filter(|domain| !domain.is_empty())
    }

    /// Header form with the address in angle brackets: `<user@domain>`.
    pub fn angle(&self) -> String {
        format!("<{}>", self.address)
    }
}
