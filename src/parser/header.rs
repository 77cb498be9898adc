//! RFC 5322 header parsing and redisplay: folding, encoded-words (RFC 2047).

use std::collections::HashSet;

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use thiserror::Error;
use tracing::debug;

use crate::error::{QuarantineError, Result};
use crate::model::header::Header;
use crate::parser::{eml, mime};

/// Maximum display width of a formatted header line before it is folded.
pub const FOLD_WIDTH: usize = 76;

/// Base64 for encoded-words: some mailers drop the trailing `=` padding.
const WORD_BASE64: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why an encoded-word could not be decoded.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WordError {
    #[error("unsupported encoded-word encoding {0:?}")]
    Encoding(String),
    #[error("invalid base64 in encoded-word")]
    Base64,
    #[error("invalid escape in Q-encoded word")]
    QEscape,
    #[error("unknown charset {0:?}")]
    Charset(String),
}

/// Parse the header section of a raw message into an ordered header list.
///
/// Field order and duplicates are preserved. Each value is unfolded and its
/// encoded-words decoded; a value whose encoded-words fail to decode is kept
/// raw, which never fails the parse as a whole. A missing header/body
/// separator or a malformed field line is a [`QuarantineError::ParseError`].
pub fn parse_headers(raw_message: &[u8]) -> Result<Vec<Header>> {
    let (header_bytes, _body) =
        eml::split_message(raw_message).ok_or_else(|| QuarantineError::ParseError {
            offset: raw_message.len() as u64,
            reason: "no blank line between header and body".to_string(),
        })?;

    let text = decode_header_bytes(header_bytes);
    let fields = unfold_headers(&text)?;

    let headers: Vec<Header> = fields
        .into_iter()
        .map(|(key, raw_value)| {
            let value = match decode_encoded_words(&raw_value) {
                Ok(decoded) => decoded,
                Err(e) => {
                    debug!(header = %key, error = %e, "Failed to decode header, keeping raw value");
                    raw_value
                }
            };
            Header { key, value }
        })
        .collect();

    mime::check_structure(&headers)?;
    debug!(count = headers.len(), "Parsed headers");
    Ok(headers)
}

/// Format every header as `Key: Value`, folding lines longer than [`FOLD_WIDTH`].
///
/// Continuation lines start with a tab. Lines end with `\n`: the result is
/// meant for a notification body, not for the wire.
pub fn format_all(headers: &[Header]) -> String {
    let mut out = String::new();
    for header in headers {
        let line = header.to_string();
        for (i, piece) in split_long_line(&line, FOLD_WIDTH).iter().enumerate() {
            if i > 0 {
                out.push('\t');
            }
            out.push_str(piece);
            out.push('\n');
        }
    }
    out
}

/// Format only the headers whose key is in `allowed` (exact, case-sensitive).
///
/// Original order and duplicates are kept. No folding is applied.
pub fn format_selected(headers: &[Header], allowed: &[&str]) -> String {
    let allowed: HashSet<&str> = allowed.iter().copied().collect();
    headers
        .iter()
        .filter(|h| allowed.contains(h.key.as_str()))
        .map(|h| format!("{h}\n"))
        .collect()
}

/// Split a line into pieces of at most `max` characters.
///
/// Breaks at the last space or tab within the first `max` characters; a
/// whitespace at position 0 does not count. Without a usable whitespace the
/// line is cut at exactly `max` characters. The remainder is trimmed before
/// the next round.
fn split_long_line(line: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;
    while let Some((limit, _)) = rest.char_indices().nth(max) {
        let cut = match rest[..limit].rfind([' ', '\t']) {
            Some(pos) if pos > 0 => pos,
            _ => limit,
        };
        pieces.push(&rest[..cut]);
        rest = rest[cut..].trim();
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

/// Decode raw header bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
fn decode_header_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Unfold header lines: continuation lines (starting with space or tab) are
/// joined to the previous field with a single space.
///
/// Returns `(name, raw_value)` pairs with the name case preserved.
fn unfold_headers(text: &str) -> Result<Vec<(String, String)>> {
    let mut result: Vec<(String, String)> = Vec::new();
    let mut offset = 0u64;

    for raw_line in text.split_inclusive('\n') {
        let line_offset = offset;
        offset += raw_line.len() as u64;
        let line = raw_line.trim_end_matches(['\r', '\n']);

        if line.starts_with([' ', '\t']) {
            let Some(last) = result.last_mut() else {
                return Err(QuarantineError::ParseError {
                    offset: line_offset,
                    reason: "continuation line before the first header".to_string(),
                });
            };
            let continuation = line.trim();
            if !continuation.is_empty() {
                if !last.1.is_empty() {
                    last.1.push(' ');
                }
                last.1.push_str(continuation);
            }
        } else if let Some((name, value)) = line.split_once(':') {
            if !Header::is_valid_key(name) {
                return Err(QuarantineError::ParseError {
                    offset: line_offset,
                    reason: format!("invalid header name {name:?}"),
                });
            }
            result.push((name.to_string(), value.trim().to_string()));
        } else {
            return Err(QuarantineError::ParseError {
                offset: line_offset,
                reason: format!("malformed header line {line:?}"),
            });
        }
    }

    Ok(result)
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// Text that merely looks like the start of an encoded-word is copied as is.
/// A well-formed word whose payload or charset cannot be decoded is an error,
/// so the caller can fall back to the raw value.
pub fn decode_encoded_words(input: &str) -> std::result::Result<String, WordError> {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        // Whitespace between two encoded words is dropped (RFC 2047 §6.2)
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_start = &remaining[start + 2..];

        match try_decode_one_word(after_start)? {
            Some(decoded) => {
                result.push_str(&decoded.text);
                remaining = &after_start[decoded.consumed..];
                last_was_encoded = true;
            }
            None => {
                result.push_str("=?");
                remaining = after_start;
                last_was_encoded = false;
            }
        }
    }

    result.push_str(remaining);
    Ok(result)
}

struct DecodedWord {
    text: String,
    consumed: usize, // bytes consumed from the string *after* the initial "=?"
}

/// Decode one `charset?encoding?text?=` word.
///
/// `Ok(None)` means the input does not have the shape of an encoded-word.
fn try_decode_one_word(s: &str) -> std::result::Result<Option<DecodedWord>, WordError> {
    let Some(first_q) = s.find('?') else {
        return Ok(None);
    };
    let charset = &s[..first_q];

    let rest = &s[first_q + 1..];
    let Some(second_q) = rest.find('?') else {
        return Ok(None);
    };
    let encoding = &rest[..second_q];

    let rest2 = &rest[second_q + 1..];
    let Some(end) = rest2.find("?=") else {
        return Ok(None);
    };
    let encoded_text = &rest2[..end];

    let has_space = |t: &str| t.contains(char::is_whitespace);
    if charset.is_empty()
        || has_space(charset)
        || encoding.len() != 1
        || has_space(encoded_text)
    {
        return Ok(None);
    }

    let bytes = match encoding {
        "B" | "b" => WORD_BASE64
            .decode(encoded_text)
            .map_err(|_| WordError::Base64)?,
        "Q" | "q" => decode_q_encoding(encoded_text)?,
        other => return Err(WordError::Encoding(other.to_string())),
    };

    Ok(Some(DecodedWord {
        text: decode_charset(charset, &bytes)?,
        consumed: first_q + 1 + second_q + 1 + end + 2,
    }))
}

/// Decode Q-encoding (RFC 2047): underscores → spaces, `=XX` → byte.
fn decode_q_encoding(input: &str) -> std::result::Result<Vec<u8>, WordError> {
    let mut result = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' => {
                let hex = bytes.get(i + 1..i + 3).ok_or(WordError::QEscape)?;
                let hex = std::str::from_utf8(hex).map_err(|_| WordError::QEscape)?;
                let byte = u8::from_str_radix(hex, 16).map_err(|_| WordError::QEscape)?;
                result.push(byte);
                i += 3;
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    Ok(result)
}

/// Decode bytes using a named charset (RFC 2231 language suffixes are ignored).
fn decode_charset(charset: &str, bytes: &[u8]) -> std::result::Result<String, WordError> {
    let label = charset.split('*').next().unwrap_or(charset);
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| WordError::Charset(charset.to_string()))?;
    let (decoded, _) = encoding.decode_without_bom_handling(bytes);
    Ok(decoded.into_owned())
}
