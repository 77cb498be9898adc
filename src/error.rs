//! Centralized error types for clamaction.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::smtp::client::SessionState;

/// All errors produced by the clamaction library.
#[derive(Error, Debug)]
pub enum QuarantineError {
    /// A required configuration variable is missing or has an invalid value.
    #[error("Configuration error for {key}: {reason}")]
    Config { key: String, reason: String },

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The metadata sidecar could not be serialized or deserialized.
    #[error("Metadata error for '{path}': {source}")]
    Metadata {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The source message is structurally unreadable.
    #[error("Parse error at offset {offset}: {reason}")]
    ParseError { offset: u64, reason: String },

    /// An SMTP delivery attempt failed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// A quarantine identifier is not exactly six letters.
    #[error("Invalid quarantine ID '{0}': must be exactly 6 letters")]
    InvalidQuarantineId(String),

    /// Another process holds the lock for this quarantine entry.
    #[error("Quarantine entry is locked by another process (remove '{0}' if stale)")]
    Locked(PathBuf),
}

/// Convenience alias for `Result<T, QuarantineError>`.
pub type Result<T> = std::result::Result<T, QuarantineError>;

impl QuarantineError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Config` variant for a missing required variable.
    pub fn missing(key: &str) -> Self {
        Self::Config {
            key: key.to_string(),
            reason: "missing required variable".to_string(),
        }
    }

    /// Create a `Config` variant for a variable with an unusable value.
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// The step of the SMTP dialogue a delivery failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpStep {
    Connect,
    Greeting,
    Hello,
    MailFrom,
    RcptTo,
    Data,
    Message,
}

impl fmt::Display for SmtpStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Greeting => "greeting",
            Self::Hello => "hello",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Data => "DATA",
            Self::Message => "message transfer",
        };
        f.write_str(name)
    }
}

/// Low-level failure inside an SMTP session.
#[derive(Error, Debug)]
pub enum SmtpError {
    /// Socket error, including timeouts and refused connections.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a code the step does not accept.
    #[error("server replied {code} {message}")]
    Rejected { code: u16, message: String },

    /// The server sent something that is not an SMTP reply.
    #[error("malformed reply: {0:?}")]
    MalformedReply(String),

    /// A command was issued in a session state that does not allow it.
    #[error("{command} is not allowed in state {state:?}")]
    OutOfOrder {
        command: &'static str,
        state: SessionState,
    },

    /// An envelope address would break the command line.
    #[error("invalid envelope address {0:?}")]
    InvalidAddress(String),
}

/// A failed delivery, tagged with the step that failed.
#[derive(Error, Debug)]
#[error("SMTP {step} failed: {source}")]
pub struct DeliveryError {
    pub step: SmtpStep,
    pub source: SmtpError,
}

impl DeliveryError {
    /// Returns a closure that wraps an [`SmtpError`] for the given step,
    /// for use with `map_err`.
    pub fn at(step: SmtpStep) -> impl FnOnce(SmtpError) -> Self {
        move |source| Self { step, source }
    }
}
