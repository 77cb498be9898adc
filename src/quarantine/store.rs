//! Moving the infected spool file into the quarantine folder.

use std::fs::File;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{QuarantineError, Result};

/// Move `source` to `destination` as copy, flush to disk, delete.
///
/// The copy is synced before the source is removed so a crash in between
/// leaves two copies rather than none. Returns the number of bytes copied.
pub fn store(source: &Path, destination: &Path) -> Result<u64> {
    debug!(path = %source.display(), "Opening source email file");
    let mut src = File::open(source).map_err(|e| QuarantineError::io(source, e))?;

    debug!(path = %destination.display(), "Creating quarantine file");
    let mut dest = File::create(destination).map_err(|e| QuarantineError::io(destination, e))?;

    let copied =
        std::io::copy(&mut src, &mut dest).map_err(|e| QuarantineError::io(destination, e))?;

    debug!(bytes = copied, "Syncing quarantine file to disk");
    dest.sync_all()
        .map_err(|e| QuarantineError::io(destination, e))?;
    drop(dest);
    drop(src);

    debug!(path = %source.display(), "Deleting original email file");
    std::fs::remove_file(source).map_err(|e| QuarantineError::io(source, e))?;

    info!(
        from = %source.display(),
        to = %destination.display(),
        bytes = copied,
        "Message quarantined"
    );
    Ok(copied)
}
