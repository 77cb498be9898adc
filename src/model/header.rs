//! A single decoded mail header.

use std::fmt;

/// One header field as found in a message, in its original position.
///
/// The key keeps its original case; the value is the unfolded text with
/// RFC 2047 encoded-words resolved (or the raw text when decoding failed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Field name, e.g. `"Received"` or `"Message-Id"`.
    pub key: String,
    /// Decoded field value.
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Whether `key` is a valid field name: printable ASCII, no colon, not empty.
    pub fn is_valid_key(key: &str) -> bool {
        !key.is_empty() && key.bytes().all(|b| (33..=126).contains(&b) && b != b':')
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let h = Header::new("Subject", "Hello");
        assert_eq!(h.to_string(), "Subject: Hello");
    }

    #[test]
    fn test_valid_keys() {
        assert!(Header::is_valid_key("X-Spam-Status"));
        assert!(Header::is_valid_key("Message-Id"));
        assert!(!Header::is_valid_key(""));
        assert!(!Header::is_valid_key("Bad Key"));
        assert!(!Header::is_valid_key("Tab\tKey"));
        assert!(!Header::is_valid_key("Colon:Key"));
        assert!(!Header::is_valid_key("Grüße"));
    }
}
