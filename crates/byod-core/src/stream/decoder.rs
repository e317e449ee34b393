//! Incremental text decoding for chunked response bodies
//!
//! Chunk boundaries fall anywhere, including inside a multi-byte UTF-8
//! sequence or in the middle of a line.

/// Stateful UTF-8 decoder that carries incomplete sequences between chunks
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Leading bytes of a sequence that hasn't finished arriving
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk. Invalid sequences become U+FFFD; a truncated
    /// sequence at the end is held back for the next chunk.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix decodes
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        out.push_str(valid);
                    }
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush at end of input; a dangling partial sequence becomes U+FFFD
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Splits decoded text into complete lines, keeping the unterminated tail
#[derive(Debug, Default)]
pub struct LineBuffer {
    partial_line: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return every line it completed (without `\n`,
    /// and without a trailing `\r`)
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.partial_line.push_str(text);

        let Some(last_newline) = self.partial_line.rfind('\n') else {
            return Vec::new();
        };

        let rest = self.partial_line.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial_line, rest);
        complete[..last_newline]
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect()
    }

    /// Text seen since the last newline
    pub fn partial(&self) -> &str {
        &self.partial_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_split_multibyte() {
        // "é" is 0xC3 0xA9, "🧬" is four bytes
        let text = "café 🧬";
        let bytes = text.as_bytes();
        let mut decoder = Utf8Decoder::new();

        let mut out = String::new();
        for byte in bytes {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        assert_eq!(out, text);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_decode_holds_truncated_tail() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xF0, 0x9F]), "a");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&[0xA7, 0xAC, b'b']), "🧬b");
    }

    #[test]
    fn test_decode_invalid_bytes_replaced() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xFF, b'y']), "x\u{FFFD}y");

        decoder.decode(&[0xE2, 0x82]);
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_lines_keep_partial_tail() {
        let mut lines = LineBuffer::new();
        assert!(lines.push("event: prog").is_empty());
        assert_eq!(lines.partial(), "event: prog");

        assert_eq!(
            lines.push("ress\ndata: {}\n\nda"),
            vec!["event: progress", "data: {}", ""]
        );
        assert_eq!(lines.partial(), "da");
    }

    #[test]
    fn test_lines_strip_carriage_return() {
        let mut lines = LineBuffer::new();
        assert_eq!(
            lines.push("event: complete\r\ndata: {}\r\n"),
            vec!["event: complete", "data: {}"]
        );
        assert_eq!(lines.partial(), "");
    }
}
