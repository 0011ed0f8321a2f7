//! Line framing for pipe payloads.
//!
//! Each frame is one line holding the payload as a JSON string literal, so
//! payloads with embedded newlines (eval output, tracebacks) survive intact.

/// Encode `payload` as one newline-terminated frame.
#[must_use]
pub fn encode(payload: &str) -> String {
    let mut line = serde_json::Value::String(payload.to_owned()).to_string();
    line.push('\n');
    line
}

/// Decode one frame line.
///
/// Lines that are not a JSON string literal are taken as the raw payload,
/// so an operator can drive a worker by hand with plain text.
#[must_use]
pub fn decode(line: &str) -> String {
    let line = line.trim_end_matches(['\r', '\n']);
    match serde_json::from_str::<String>(line) {
        Ok(payload) => payload,
        Err(_) => line.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_payload_fits_one_frame() {
        let frame = encode("line one\nline two");
        assert_eq!(frame.matches('\n').count(), 1);
        assert_eq!(decode(&frame), "line one\nline two");
    }

    #[test]
    fn structured_commands_are_escaped() {
        let frame = encode(r#"{"command":"ping"}"#);
        assert_eq!(frame, "\"{\\\"command\\\":\\\"ping\\\"}\"\n");
        assert_eq!(decode(&frame), r#"{"command":"ping"}"#);
    }

    #[test]
    fn raw_lines_decode_as_themselves() {
        assert_eq!(decode("ping\r\n"), "ping");
        assert_eq!(decode(r#"{"command":"ping"}"#), r#"{"command":"ping"}"#);
    }
}
