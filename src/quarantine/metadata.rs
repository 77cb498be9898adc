//! Reading and writing the JSON metadata sidecar.

use std::path::Path;

use tracing::debug;

use crate::error::{QuarantineError, Result};
use crate::model::metadata::QuarantineMetadata;

/// Write `metadata` as pretty-printed JSON (2-space indent) to `path`.
///
/// The record goes to `<path>.tmp` first and is renamed into place, so a
/// concurrent reader sees either no sidecar or a complete one.
pub fn save(path: &Path, metadata: &QuarantineMetadata) -> Result<()> {
    let json = serde_json::to_vec_pretty(metadata).map_err(|e| QuarantineError::Metadata {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    std::fs::write(&tmp, json).map_err(|e| QuarantineError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| QuarantineError::io(path, e))?;
    debug!(path = %path.display(), "Saved quarantine metadata");
    Ok(())
}

/// Load a sidecar written by [`save`].
pub fn load(path: &Path) -> Result<QuarantineMetadata> {
    let data = std::fs::read(path).map_err(|e| QuarantineError::io(path, e))?;
    let metadata = serde_json::from_slice(&data).map_err(|e| QuarantineError::Metadata {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), "Loaded quarantine metadata");
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QuarantineMetadata {
        QuarantineMetadata {
            envelope_sender: "alice@x.com".to_string(),
            envelope_recipients: vec!["bob@y.com".to_string(), "carol@y.com".to_string()],
            virus_name: "Eicar-Test-Signature".to_string(),
            quarantine_time: "2024-01-04T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("virus.abcdef.json");
        save(&path, &sample()).unwrap();

        assert_eq!(load(&path).unwrap(), sample());
        assert!(!tmp.path().join("virus.abcdef.json.tmp").exists());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"envelope_sender\": \"alice@x.com\","));
    }

    #[test]
    fn test_load_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load(&tmp.path().join("virus.abcdef.json")).unwrap_err();
        assert!(matches!(err, QuarantineError::Io { .. }));
    }

    #[test]
    fn test_load_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("virus.abcdef.json");
        std::fs::write(&path, b"{\"envelope_sender\": ").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, QuarantineError::Metadata { .. }));
    }
}
