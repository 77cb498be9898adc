//! Integration tests for header parsing, folding, and notification building.

use std::path::Path;

use clamaction::compose::builder::{build_with_attachment, serialize};
use clamaction::model::header::Header;
use clamaction::notify::RECIPIENT_HEADERS;
use clamaction::parser::eml::read_eml;
use clamaction::parser::header::{format_all, format_selected, parse_headers};

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn infected_headers() -> Vec<Header> {
    let raw = read_eml(fixture("infected.eml")).unwrap();
    parse_headers(&raw).unwrap()
}

fn value<'a>(headers: &'a [Header], key: &str) -> &'a str {
    headers
        .iter()
        .find(|h| h.key == key)
        .map(|h| h.value.as_str())
        .unwrap_or_else(|| panic!("missing header {key}"))
}

// ─── Test 1: Header order and count (CRLF fixture) ──────────────────

#[test]
fn test_parse_infected_header_order() {
    let headers = infected_headers();
    let keys: Vec<&str> = headers.iter().map(|h| h.key.as_str()).collect();
    assert_eq!(
        keys,
        [
            "Return-Path",
            "Received",
            "Message-Id",
            "Sender",
            "From",
            "To",
            "Date",
            "Subject",
            "X-Broken",
            "MIME-Version",
            "Content-Type",
        ]
    );
}

// ─── Test 2: Encoded words decoded, broken ones kept raw ────────────

#[test]
fn test_parse_infected_decoding() {
    let headers = infected_headers();
    assert_eq!(value(&headers, "From"), "Alice Álvarez <alice@x.com>");
    assert_eq!(value(&headers, "Subject"), "Factura pendiente á");
    assert_eq!(value(&headers, "X-Broken"), "=?UTF-8?B?!!!notbase64?=");
}

// ─── Test 3: Folded Received header is unfolded ─────────────────────

#[test]
fn test_parse_infected_unfolding() {
    let headers = infected_headers();
    assert_eq!(
        value(&headers, "Received"),
        "from mx.x.com (mx.x.com [192.0.2.10]) by mail.y.com (Postfix) with ESMTP id 4T0abc \
         for <bob@y.com>; Thu, 4 Jan 2024 10:00:00 +0000"
    );
}

// ─── Test 4: format_all folds at whitespace, keeps every word ───────

#[test]
fn test_format_all_folds_received() {
    let headers = infected_headers();
    let received: Vec<Header> = headers
        .iter()
        .filter(|h| h.key == "Received")
        .cloned()
        .collect();
    let formatted = format_all(&received);

    let lines: Vec<&str> = formatted.lines().collect();
    assert!(lines.len() > 1, "Received should be folded: {formatted:?}");
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line.starts_with('\t'), i > 0, "line {i}: {line:?}");
        assert!(line.trim_start_matches('\t').chars().count() <= 76, "line {i} too long");
    }

    let rejoined = lines
        .iter()
        .map(|l| l.trim_start_matches('\t'))
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(rejoined, received[0].to_string());
}

// ─── Test 5: Word longer than the width is cut at 76 ────────────────

#[test]
fn test_format_all_force_break() {
    let raw = read_eml(fixture("long_headers.eml")).unwrap();
    let headers = parse_headers(&raw).unwrap();
    let formatted = format_all(&headers[..1]);
    let lines: Vec<&str> = formatted.lines().collect();

    assert_eq!(lines[0], "Received: from");
    let second = lines[1].strip_prefix('\t').unwrap();
    assert_eq!(second.chars().count(), 76);
    assert!(second.starts_with("relay-aaaa"));
    assert!(formatted.ends_with("by mail.y.com\n"));
}

// ─── Test 6: LF-only message, every line within width ───────────────

#[test]
fn test_format_all_long_headers_width() {
    let raw = read_eml(fixture("long_headers.eml")).unwrap();
    let headers = parse_headers(&raw).unwrap();
    assert_eq!(headers.len(), 8);

    let formatted = format_all(&headers);
    assert!(formatted.ends_with('\n'));
    for line in formatted.lines() {
        assert!(line.trim_start_matches('\t').chars().count() <= 76, "{line:?}");
    }
}

// ─── Test 7: Recipient excerpt keeps only the allowed headers ───────

#[test]
fn test_format_selected_recipient_headers() {
    let headers = infected_headers();
    let excerpt = format_selected(&headers, RECIPIENT_HEADERS);
    assert_eq!(
        excerpt,
        "Message-Id: <20240104100000.1234@x.com>\n\
         Sender: alice@x.com\n\
         From: Alice Álvarez <alice@x.com>\n\
         To: bob@y.com, carol@y.com, dave@y.com\n\
         Date: Thu, 4 Jan 2024 10:00:00 +0000\n\
         Subject: Factura pendiente á\n"
    );
}

// ─── Test 8: Missing boundary / malformed lines are parse errors ────

#[test]
fn test_parse_errors() {
    let no_boundary = b"From: a@x.com\r\nContent-Type: multipart/mixed\r\n\r\nbody";
    assert!(parse_headers(no_boundary).is_err());

    let no_colon = b"From: a@x.com\r\nthis is not a header\r\n\r\nbody";
    assert!(parse_headers(no_colon).is_err());

    let no_body_separator = b"From: a@x.com\r\n";
    assert!(parse_headers(no_body_separator).is_err());
}

// ─── Test 9: Admin message reads back as MIME, attachment bit-exact ─

#[test]
fn test_multipart_read_back() {
    use mail_parser::{MessageParser, MimeHeaders};

    let original = read_eml(fixture("infected.eml")).unwrap();
    let message = build_with_attachment(
        "clamav@y.com",
        "admin@y.com",
        "Quarantined email",
        "Report text\n",
        &original,
        "virus.abcdef",
    );
    let wire = serialize(&message);

    let parsed = MessageParser::default().parse(&wire[..]).unwrap();
    assert_eq!(parsed.subject(), Some("Quarantined email"));
    assert!(parsed.body_text(0).unwrap().contains("Report text"));
    assert_eq!(parsed.attachment_count(), 1);

    let attachment = parsed.attachment(0).unwrap();
    assert_eq!(attachment.attachment_name(), Some("virus.abcdef.eml"));
    let content_type = attachment.content_type().unwrap();
    assert_eq!(content_type.ctype(), "message");
    assert_eq!(content_type.subtype(), Some("rfc822"));

    // The stored bytes sit unchanged between the part header and the closing delimiter.
    let clamaction::model::message::Body::Multipart { boundary, .. } = &message.body else {
        panic!("expected multipart body");
    };
    let closing = format!("\r\n--{boundary}--\r\n");
    assert!(wire.ends_with(closing.as_bytes()));
    let before_closing = &wire[..wire.len() - closing.len()];
    assert!(before_closing.ends_with(&original));
}
