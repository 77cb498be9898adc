//! Raw `.eml` handling: reading a message from disk and splitting header from body.

use std::path::Path;

use crate::error::{QuarantineError, Result};

/// Read a whole message file into memory.
pub fn read_eml(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| QuarantineError::io(path, e))
}

/// Split a message at the first blank line.
///
/// Returns `(header_section, body)`. The header section keeps the line
/// terminator of its last field; the blank line itself belongs to neither.
/// Both `\n` and `\r\n` line endings are accepted, also mixed.
/// Returns `None` when no terminated blank line exists.
pub fn split_message(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut line_start = 0;
    loop {
        let rest = &data[line_start..];
        let line_len = rest.iter().position(|&b| b == b'\n')?;
        let line = &rest[..line_len];
        if line.is_empty() || line == b"\r" {
            let body_start = line_start + line_len + 1;
            return Some((&data[..line_start], &data[body_start..]));
        }
        line_start += line_len + 1;
    }
}
