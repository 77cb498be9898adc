//! Build RFC 5322 / MIME messages from scratch and serialize them to wire bytes.

use rand::RngCore;

use crate::model::header::Header;
use crate::model::message::{Body, OutboundMessage, Part};

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=UTF-8";

/// Random bytes per boundary; hex encoding doubles this to 60 characters.
const BOUNDARY_BYTES: usize = 30;

/// Build a single-part `text/plain` message.
pub fn build_plain(from: &str, to: &str, subject: &str, text: &str) -> OutboundMessage {
    OutboundMessage {
        headers: top_level_headers(from, to, subject, TEXT_PLAIN_UTF8.to_string()),
        body: Body::Plain(text.to_string()),
    }
}

/// Build a `multipart/mixed` message: a text part followed by `attachment`
/// as a `message/rfc822` part.
///
/// The attachment bytes are carried unmodified. The file name becomes
/// `<attachment_name>.eml`, or `attachment.eml` when the name is empty.
pub fn build_with_attachment(
    from: &str,
    to: &str,
    subject: &str,
    text: &str,
    attachment: &[u8],
    attachment_name: &str,
) -> OutboundMessage {
    let boundary = generate_boundary(&[text.as_bytes(), attachment]);
    let name = if attachment_name.is_empty() {
        "attachment"
    } else {
        attachment_name
    };

    let parts = vec![
        Part {
            headers: vec![Header::new("Content-Type", TEXT_PLAIN_UTF8)],
            content: text.as_bytes().to_vec(),
        },
        Part {
            headers: vec![
                Header::new("Content-Type", "message/rfc822"),
                Header::new(
                    "Content-Disposition",
                    format!("attachment; filename=\"{name}.eml\""),
                ),
            ],
            content: attachment.to_vec(),
        },
    ];

    OutboundMessage {
        headers: top_level_headers(
            from,
            to,
            subject,
            format!("multipart/mixed; boundary={boundary}"),
        ),
        body: Body::Multipart { boundary, parts },
    }
}

fn top_level_headers(from: &str, to: &str, subject: &str, content_type: String) -> Vec<Header> {
    vec![
        Header::new("From", from),
        Header::new("To", to),
        Header::new("Subject", subject),
        Header::new("MIME-Version", "1.0"),
        Header::new("Content-Type", content_type),
    ]
}

/// Serialize a message: `Key: Value\r\n` headers, a blank line, then the body.
///
/// Multipart bodies are framed per RFC 2046: `--boundary` before each part,
/// `--boundary--` after the last one.
pub fn serialize(message: &OutboundMessage) -> Vec<u8> {
    let mut out = Vec::new();
    append_headers(&mut out, &message.headers);
    out.extend_from_slice(b"\r\n");

    match &message.body {
        Body::Plain(text) => out.extend_from_slice(text.as_bytes()),
        Body::Multipart { boundary, parts } => {
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    out.extend_from_slice(b"\r\n");
                }
                out.extend_from_slice(b"--");
                out.extend_from_slice(boundary.as_bytes());
                out.extend_from_slice(b"\r\n");
                append_headers(&mut out, &part.headers);
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(&part.content);
            }
            out.extend_from_slice(b"\r\n--");
            out.extend_from_slice(boundary.as_bytes());
            out.extend_from_slice(b"--\r\n");
        }
    }

    out
}

/// Prepend a block of `Resent-*` fields to a stored message.
pub fn build_resent(original: &[u8], resent_headers: &[Header]) -> Vec<u8> {
    let mut out = Vec::with_capacity(original.len() + 256);
    append_headers(&mut out, resent_headers);
    out.extend_from_slice(original);
    out
}

fn append_headers(out: &mut Vec<u8>, headers: &[Header]) {
    for header in headers {
        out.extend_from_slice(header.key.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(header.value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
}

/// Generate a random hex boundary that does not occur in any of `contents`.
fn generate_boundary(contents: &[&[u8]]) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let mut bytes = [0u8; BOUNDARY_BYTES];
        rng.fill_bytes(&mut bytes);
        let boundary: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let clashes = contents
            .iter()
            .any(|c| contains(c, boundary.as_bytes()));
        if !clashes {
            return boundary;
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
