//! DATA payload encoding (RFC 5321 §4.5.2).

/// Encode a message for transmission after `DATA`.
///
/// Bare `\n` line endings become `\r\n`, a `.` at the start of a line is
/// doubled, and the `.\r\n` terminator is appended (preceded by `\r\n` when
/// the message does not end with a line break).
pub fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 32 + 5);
    let mut at_line_start = true;
    let mut prev = None;

    for &b in message {
        if at_line_start && b == b'.' {
            out.push(b'.');
        }
        if b == b'\n' && prev != Some(b'\r') {
            out.push(b'\r');
        }
        out.push(b);
        at_line_start = b == b'\n';
        prev = Some(b);
    }

    if !at_line_start {
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_after_line_break_is_doubled() {
        assert_eq!(encode_data(b"Hi\r\n.\r\nBye\r\n"), b"Hi\r\n..\r\nBye\r\n.\r\n");
    }

    #[test]
    fn leading_dot_is_doubled() {
        assert_eq!(encode_data(b".hidden\r\n"), b"..hidden\r\n.\r\n");
    }

    #[test]
    fn bare_lf_is_normalized() {
        assert_eq!(encode_data(b"a\nb\n"), b"a\r\nb\r\n.\r\n");
        assert_eq!(encode_data(b"a\n.b"), b"a\r\n..b\r\n.\r\n");
    }

    #[test]
    fn missing_final_line_break_is_added() {
        assert_eq!(encode_data(b"Body"), b"Body\r\n.\r\n");
    }

    #[test]
    fn empty_message_is_just_the_terminator() {
        assert_eq!(encode_data(b""), b".\r\n");
    }
}
