//! Runtime configuration.
//!
//! clamsmtpd hands a `VirusAction` script its context in environment
//! variables (`EMAIL`, `VIRUS`, `RECIPIENTS`, `SENDER`); the remaining keys
//! describe the local setup. Values are looked up in:
//! 1. the process environment
//! 2. a TOML file with the same keys in lowercase, found at
//!    `$CLAMACTION_CONFIG` or `~/.config/clamaction/config.toml` (Linux/macOS),
//!    `%APPDATA%\clamaction\config.toml` (Windows)
//!
//! Empty values count as missing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{QuarantineError, Result};
use crate::smtp::SmtpTransport;

/// Every key the tools read.
pub const KEYS: &[&str] = &[
    "EMAIL",
    "VIRUS",
    "RECIPIENTS",
    "SENDER",
    "EMAIL_ADMIN",
    "EMAIL_SERVICE",
    "QUARANTINE_FOLDER",
    "SMTP_HOST",
    "SMTP_PORT",
    "DEBUG",
];

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CLAMACTION_CONFIG";

/// Raw key/value pairs from the environment and the optional config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    values: HashMap<String, String>,
}

impl ConfigSource {
    /// Read the config file (if present), then overlay the environment.
    pub fn load() -> Result<Self> {
        let mut source = Self::default();
        if let Some(path) = config_file_path() {
            if path.exists() {
                source.merge_file(&path)?;
            }
        }
        source.merge_env();
        Ok(source)
    }

    /// Build a source from explicit pairs (used by tests and embedders).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Merge values from a TOML file. Keys already present are overwritten.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| QuarantineError::io(path, e))?;
        let table: toml::Table = toml::from_str(&contents)
            .map_err(|e| QuarantineError::invalid(CONFIG_ENV, format!("{}: {e}", path.display())))?;

        for (key, value) in table {
            let upper = key.to_ascii_uppercase();
            if !KEYS.contains(&upper.as_str()) {
                warn!(path = %path.display(), key = %key, "Ignoring unknown config key");
                continue;
            }
            let value = toml_value_to_string(value)
                .ok_or_else(|| QuarantineError::invalid(&upper, "unsupported value type"))?;
            self.values.insert(upper, value);
        }

        info!(path = %path.display(), "Loaded config file");
        Ok(())
    }

    /// Overlay non-empty environment variables for every known key.
    fn merge_env(&mut self) {
        for key in KEYS {
            if let Ok(value) = std::env::var(key) {
                if !value.is_empty() {
                    self.values.insert((*key).to_string(), value);
                }
            }
        }
    }

    /// Value of `key`, `None` when unset or empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Value of `key`, or a configuration error naming it.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| QuarantineError::missing(key))
    }

    /// `DEBUG=true` enables debug-level tracing.
    pub fn debug(&self) -> bool {
        self.get("DEBUG")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

fn toml_value_to_string(value: toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        // RECIPIENTS may be written as a list.
        toml::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                toml::Value::String(s) => Some(s),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(|items| items.join("\n")),
        _ => None,
    }
}

/// SMTP relay used for every outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25,
        }
    }
}

/// Settings shared by the quarantine and release tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Relay for notifications and releases.
    pub smtp: SmtpSettings,
    /// Address notifications are sent from (`From:` and `MAIL FROM`).
    pub email_service: String,
    /// Directory holding quarantined messages and their sidecars.
    pub quarantine_folder: PathBuf,
    /// Debug-level tracing requested.
    pub debug: bool,
}

impl ServiceConfig {
    pub fn from_source(source: &ConfigSource) -> Result<Self> {
        let email_service = source.require("EMAIL_SERVICE")?.to_string();
        let folder = source.require("QUARANTINE_FOLDER")?;
        let trimmed = folder.trim_end_matches('/');
        let quarantine_folder = PathBuf::from(if trimmed.is_empty() { "/" } else { trimmed });

        let mut smtp = SmtpSettings::default();
        if let Some(host) = source.get("SMTP_HOST") {
            smtp.host = host.to_string();
        }
        if let Some(port) = source.get("SMTP_PORT") {
            smtp.port = port
                .trim()
                .parse()
                .map_err(|_| QuarantineError::invalid("SMTP_PORT", format!("{port:?} is not a port number")))?;
        }

        Ok(Self {
            smtp,
            email_service,
            quarantine_folder,
            debug: source.debug(),
        })
    }

    /// SMTP transport for the configured relay.
    pub fn transport(&self) -> SmtpTransport {
        SmtpTransport::new(&self.smtp.host, self.smtp.port)
    }
}

/// Everything `clamaction` needs for one infected message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionConfig {
    /// Spool file of the infected message.
    pub email: PathBuf,
    /// Virus name reported by the scanner.
    pub virus: String,
    /// Envelope recipients; blank lines of `RECIPIENTS` are dropped.
    pub recipients: Vec<String>,
    /// Envelope sender.
    pub sender: String,
    /// Administrator who receives the full report.
    pub email_admin: String,
    pub service: ServiceConfig,
}

impl ActionConfig {
    pub fn from_source(source: &ConfigSource) -> Result<Self> {
        let email = PathBuf::from(source.require("EMAIL")?);
        let virus = source.require("VIRUS")?.to_string();
        let recipients = source
            .require("RECIPIENTS")?
            .lines()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
            .collect();
        let sender = source.require("SENDER")?.to_string();
        let email_admin = source.require("EMAIL_ADMIN")?.to_string();
        let service = ServiceConfig::from_source(source)?;

        Ok(Self {
            email,
            virus,
            recipients,
            sender,
            email_admin,
            service,
        })
    }
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("clamaction").join("config.toml"))
}
