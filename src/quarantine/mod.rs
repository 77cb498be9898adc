//! Quarantine directory layout: file names, identifiers, and sidecar paths.
//!
//! ```text
//! <folder>/virus.<id>        quarantined message, byte-for-byte
//! <folder>/virus.<id>.json   QuarantineMetadata sidecar
//! <folder>/virus.<id>.lock   present while a process works on <id>
//! ```

pub mod lock;
pub mod metadata;
pub mod store;

use std::path::{Path, PathBuf};

use crate::error::{QuarantineError, Result};

/// Prefix of every quarantined file name.
pub const FILE_PREFIX: &str = "virus.";

/// Length of a quarantine identifier.
pub const ID_LEN: usize = 6;

const SIDECAR_SUFFIX: &str = ".json";

/// The pair of files that make up one quarantined message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantineEntry {
    /// File name inside the quarantine folder, e.g. `virus.abcdef`.
    pub name: String,
    /// Path of the quarantined message.
    pub file: PathBuf,
    /// Path of the metadata sidecar.
    pub sidecar: PathBuf,
}

impl QuarantineEntry {
    /// Entry for a file name inside `folder`.
    pub fn new(folder: &Path, name: &str) -> Self {
        let file = folder.join(name);
        let sidecar = sidecar_path(&file);
        Self {
            name: name.to_string(),
            file,
            sidecar,
        }
    }

    /// Entry for the MTA's spool file `email`.
    ///
    /// clamsmtpd names its temporary files `virus.XXXXXX`; other names get the
    /// prefix added so release can find them.
    pub fn for_email(folder: &Path, email: &Path) -> Result<Self> {
        let base = email
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                QuarantineError::invalid(
                    "EMAIL",
                    format!("no usable file name in '{}'", email.display()),
                )
            })?;
        let name = if base.starts_with(FILE_PREFIX) {
            base.to_string()
        } else {
            format!("{FILE_PREFIX}{base}")
        };
        Ok(Self::new(folder, &name))
    }

    /// Entry for a validated quarantine identifier.
    pub fn for_id(folder: &Path, id: &str) -> Result<Self> {
        validate_id(id)?;
        Ok(Self::new(folder, &format!("{FILE_PREFIX}{id}")))
    }

    /// Identifier shown to recipients: see [`quarantine_id`].
    pub fn id(&self) -> &str {
        quarantine_id(&self.name)
    }
}

/// Suffix of a file name after its last `.`; the whole name if it has none.
///
/// `"virus.abcdef"` → `"abcdef"`
pub fn quarantine_id(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) => &file_name[pos + 1..],
        None => file_name,
    }
}

/// Accept exactly [`ID_LEN`] ASCII letters.
pub fn validate_id(id: &str) -> Result<()> {
    if id.len() == ID_LEN && id.bytes().all(|b| b.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(QuarantineError::InvalidQuarantineId(id.to_string()))
    }
}

/// Sidecar path for a quarantined file: the file path with `.json` appended.
pub fn sidecar_path(file: &Path) -> PathBuf {
    let mut path = file.as_os_str().to_owned();
    path.push(SIDECAR_SUFFIX);
    PathBuf::from(path)
}

/// Quarantined file a sidecar belongs to, if `sidecar` ends in `.json`.
pub fn file_for_sidecar(sidecar: &Path) -> Option<PathBuf> {
    let name = sidecar.file_name()?.to_str()?;
    let stem = name.strip_suffix(SIDECAR_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(sidecar.with_file_name(stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarantine_id() {
        assert_eq!(quarantine_id("virus.abcdef"), "abcdef");
        assert_eq!(quarantine_id("virus.some.user.qwerty"), "qwerty");
        assert_eq!(quarantine_id("noseparator"), "noseparator");
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("abcdef").is_ok());
        assert!(validate_id("AbCdEf").is_ok());
        for bad in ["abcde1", "abcdefg", "", "abcde", "abc.ef", "ábcdef"] {
            assert!(
                matches!(validate_id(bad), Err(QuarantineError::InvalidQuarantineId(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_sidecar_mapping() {
        let sidecar = Path::new("/var/quarantine/virus.someuser.json");
        assert_eq!(
            file_for_sidecar(sidecar),
            Some(PathBuf::from("/var/quarantine/virus.someuser"))
        );
        assert_eq!(
            sidecar_path(Path::new("/var/quarantine/virus.someuser")),
            sidecar
        );
        assert_eq!(file_for_sidecar(Path::new("/q/virus.someuser")), None);
        assert_eq!(file_for_sidecar(Path::new("/q/.json")), None);
    }

    #[test]
    fn test_entry_for_email_keeps_existing_prefix() {
        let entry =
            QuarantineEntry::for_email(Path::new("/q"), Path::new("/spool/virus.qwerty")).unwrap();
        assert_eq!(entry.name, "virus.qwerty");
        assert_eq!(entry.file, PathBuf::from("/q/virus.qwerty"));
        assert_eq!(entry.sidecar, PathBuf::from("/q/virus.qwerty.json"));
        assert_eq!(entry.id(), "qwerty");
    }

    #[test]
    fn test_entry_for_email_adds_prefix() {
        let entry =
            QuarantineEntry::for_email(Path::new("/q"), Path::new("/spool/clamsmtpd.XyZabc"))
                .unwrap();
        assert_eq!(entry.name, "virus.clamsmtpd.XyZabc");
        assert_eq!(entry.id(), "XyZabc");
    }

    #[test]
    fn test_entry_for_id() {
        let entry = QuarantineEntry::for_id(Path::new("/q"), "abcdef").unwrap();
        assert_eq!(entry.file, PathBuf::from("/q/virus.abcdef"));
        assert_eq!(entry.sidecar, PathBuf::from("/q/virus.abcdef.json"));
        assert!(QuarantineEntry::for_id(Path::new("/q"), "../etc").is_err());
    }
}
