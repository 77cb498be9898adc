//! Per-identifier advisory lock file.
//!
//! Quarantine and release both hold `<folder>/<name>.lock` while they touch an
//! entry, so a release never races a quarantine still writing the same
//! identifier and two releases of one identifier run one after the other.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{QuarantineError, Result};

/// Held lock; the lock file is removed on drop.
#[derive(Debug)]
pub struct EntryLock {
    path: PathBuf,
}

impl EntryLock {
    /// Take the lock for entry `name` in `folder`.
    ///
    /// Fails with [`QuarantineError::Locked`] if the lock file already exists.
    /// A lock left behind by a crashed process has to be removed by hand; the
    /// file contains the owner's PID.
    pub fn acquire(folder: &Path, name: &str) -> Result<Self> {
        let path = folder.join(format!("{name}.lock"));
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(QuarantineError::Locked(path));
            }
            Err(e) => return Err(QuarantineError::io(&path, e)),
        };

        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            warn!(path = %path.display(), error = %e, "Could not write PID to lock file");
        }
        debug!(path = %path.display(), "Acquired quarantine lock");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EntryLock {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Released quarantine lock"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Could not remove lock file"),
        }
    }
}
