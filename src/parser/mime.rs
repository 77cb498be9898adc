//! MIME structure checks on a parsed header list.

use crate::error::{QuarantineError, Result};
use crate::model::header::Header;

/// Extract a parameter from a structured header value such as `Content-Type`.
///
/// `content_type_param("multipart/mixed; boundary=\"abc\"", "boundary")` → `Some("abc")`.
/// Parameter names match case-insensitively; surrounding quotes are removed.
pub fn content_type_param(value: &str, name: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case(name) {
            Some(val.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Reject messages whose top-level structure cannot be read.
///
/// A `multipart/*` message needs a non-empty `boundary` parameter; without it
/// the body parts cannot be delimited.
pub fn check_structure(headers: &[Header]) -> Result<()> {
    let Some(content_type) = headers
        .iter()
        .find(|h| h.key.eq_ignore_ascii_case("Content-Type"))
    else {
        return Ok(());
    };

    let media_type = content_type
        .value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if media_type.starts_with("multipart/") {
        let boundary = content_type_param(&content_type.value, "boundary");
        if boundary.as_deref().map_or(true, str::is_empty) {
            return Err(QuarantineError::ParseError {
                offset: 0,
                reason: format!("{media_type} without a boundary parameter"),
            });
        }
    }

    Ok(())
}
