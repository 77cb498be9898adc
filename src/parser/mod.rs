//! Source message parsing: header/body split, header decoding, MIME structure checks.

pub mod eml;
pub mod header;
pub mod mime;
