//! Incremental decoding of `data:`-framed chat streams

use crate::types::StreamFrame;

/// Prefix marking a payload line
pub const DATA_PREFIX: &str = "data: ";

/// Longest partial line kept while waiting for its newline
pub const MAX_LINE_LEN: usize = 1024 * 1024;

/// UTF-8 decoder that tolerates characters split across chunk boundaries.
///
/// Bytes of an incomplete trailing sequence are held back until the next
/// chunk arrives. Sequences that can never become valid decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, returning all text that is complete so far
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut text = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    text.push_str(valid);
                    self.pending.clear();
                    return text;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&self.pending[..valid_up_to]));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid_up_to + len);
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more bytes
                            self.pending.drain(..valid_up_to);
                            return text;
                        }
                    }
                }
            }
        }
    }

    /// Flush whatever is still pending at end of stream
    pub fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }

}

/// A decoded frame, reduced to what the assembler acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// Full cumulative text of the assistant turn so far
    Content {
        content: String,
        model: Option<String>,
    },
    /// End-of-turn marker
    End,
}

/// Splits decoded text into lines and parses `data:` payloads.
///
/// A line that spans two chunks is buffered until its newline arrives. A
/// partial line longer than [`MAX_LINE_LEN`] is dropped along with the rest
/// of that line.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    utf8: Utf8Decoder,
    line: String,
    /// Discarding an oversized line until the next newline
    skipping: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes, returning the frames completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<FrameEvent> {
        let text = self.utf8.decode(chunk);
        self.line.push_str(&text);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.line[start..].find('\n') {
            let end = start + pos;
            if self.skipping {
                self.skipping = false;
            } else {
                parse_line(self.line[start..end].trim_end_matches('\r'), &mut events);
            }
            start = end + 1;
        }
        self.line.drain(..start);

        if self.line.len() > MAX_LINE_LEN {
            tracing::warn!(len = self.line.len(), "Dropping oversized stream line");
            self.line.clear();
            self.skipping = true;
        }
        events
    }

    /// Process the final line of a stream that did not end with a newline
    pub fn finish(&mut self) -> Vec<FrameEvent> {
        let rest = self.utf8.finish();
        self.line.push_str(&rest);

        let line = std::mem::take(&mut self.line);
        let mut events = Vec::new();
        if !std::mem::take(&mut self.skipping) {
            parse_line(line.trim_end_matches('\r'), &mut events);
        }
        events
    }
}

/// Parse one line, appending the events it carries.
///
/// Lines without the `data: ` prefix are ignored; malformed JSON is logged
/// and dropped.
pub fn parse_line(line: &str, events: &mut Vec<FrameEvent>) {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return;
    };

    match serde_json::from_str::<StreamFrame>(payload) {
        Ok(frame) => {
            let is_end = frame.is_end();
            if let Some(content) = frame.content {
                events.push(FrameEvent::Content {
                    content,
                    model: frame.model,
                });
            }
            if is_end {
                events.push(FrameEvent::End);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, payload, "Skipping malformed stream frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(text: &str) -> FrameEvent {
        FrameEvent::Content {
            content: text.to_string(),
            model: None,
        }
    }

    #[test]
    fn test_utf8_split_multibyte_char() {
        // "é" is 0xC3 0xA9, "🦀" is four bytes
        let bytes = "café 🦀".as_bytes();
        let split = bytes.len() - 2;

        let mut decoder = Utf8Decoder::new();
        let first = decoder.decode(&bytes[..split]);
        assert_eq!(first, "café ");
        assert!(!first.contains(char::REPLACEMENT_CHARACTER));

        let second = decoder.decode(&bytes[split..]);
        assert_eq!(second, "🦀");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_utf8_byte_at_a_time() {
        let text = "日本語テキスト";
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        for b in text.as_bytes() {
            out.push_str(&decoder.decode(std::slice::from_ref(b)));
        }
        assert_eq!(out, text);
    }

    #[test]
    fn test_utf8_invalid_bytes_do_not_stall() {
        let mut decoder = Utf8Decoder::new();
        let out = decoder.decode(b"ab\xFFcd");
        assert_eq!(out, "ab\u{FFFD}cd");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_utf8_finish_flushes_dangling_bytes() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"x\xE6\x97"), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_non_data_lines_ignored() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(b": keep-alive\nevent: message\n\nid: 7\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_data_prefix_requires_space() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(b"data:{\"content\":\"x\"}\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_malformed_frame_skipped_and_processing_continues() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(b"data: {\"content\":\"A\"}\ndata: {not json\ndata: {\"content\":\"AB\"}\n");
        assert_eq!(events, vec![content("A"), content("AB")]);

        let events = decoder.push(b"data: {\"content\":\"ABC\"}\n");
        assert_eq!(events, vec![content("ABC")]);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"conte").is_empty());
        let events = decoder.push(b"nt\":\"Hi\"}\n");
        assert_eq!(events, vec![content("Hi")]);
    }

    #[test]
    fn test_multibyte_split_inside_frame() {
        let line = "data: {\"content\":\"héllo\"}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&line[..split]).is_empty());
        let events = decoder.push(&line[split..]);
        assert_eq!(events, vec![content("héllo")]);
    }

    #[test]
    fn test_crlf_lines() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(b"data: {\"content\":\"x\"}\r\n\r\n");
        assert_eq!(events, vec![content("x")]);
    }

    #[test]
    fn test_model_and_end_marker() {
        let mut decoder = FrameDecoder::new();
        let events =
            decoder.push(b"data: {\"content\":\"x\",\"model\":\"deepseek-chat\"}\ndata: {\"type\":\"end\"}\n");
        assert_eq!(
            events,
            vec![
                FrameEvent::Content {
                    content: "x".into(),
                    model: Some("deepseek-chat".into()),
                },
                FrameEvent::End,
            ]
        );
    }

    #[test]
    fn test_content_and_end_in_same_frame() {
        let mut events = Vec::new();
        parse_line(r#"data: {"content":"done","type":"end"}"#, &mut events);
        assert_eq!(events, vec![content("done"), FrameEvent::End]);
    }

    #[test]
    fn test_frame_without_known_fields_ignored() {
        let mut events = Vec::new();
        parse_line(r#"data: {"usage":{"tokens":3}}"#, &mut events);
        parse_line(r#"data: {"type":"start"}"#, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_many_lines_in_one_chunk() {
        let mut chunk = String::new();
        for i in 0..500 {
            chunk.push_str(&format!("data: {{\"content\":\"{}\"}}\n\n", i));
        }
        chunk.push_str("data: {\"content\":\"par");

        let mut decoder = FrameDecoder::new();
        let events = decoder.push(chunk.as_bytes());
        assert_eq!(events.len(), 500);
        assert_eq!(events[499], content("499"));

        let events = decoder.push(b"tial\"}\n");
        assert_eq!(events, vec![content("partial")]);
    }

    #[test]
    fn test_oversized_line_dropped() {
        let mut decoder = FrameDecoder::new();
        let mut huge = String::from("data: {\"content\":\"");
        huge.push_str(&"x".repeat(MAX_LINE_LEN));
        assert!(decoder.push(huge.as_bytes()).is_empty());

        // Rest of the oversized line is discarded; the next line parses
        let events = decoder.push(b"xxx\"}\ndata: {\"content\":\"ok\"}\n");
        assert_eq!(events, vec![content("ok")]);
    }

    #[test]
    fn test_finish_parses_unterminated_line() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"content\":\"tail\"}").is_empty());
        assert_eq!(decoder.finish(), vec![content("tail")]);
        assert!(decoder.finish().is_empty());
    }
}
