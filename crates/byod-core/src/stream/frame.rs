//! Event-stream framing: lines to named data frames
//!
//! - `event: <name>` sets the current event name (trimmed); it stays set
//!   across blank lines until the next `event:` line
//! - `data: <payload>` yields a frame under the current event name
//! - anything else, blank lines and `:` comments included, is ignored

use super::decoder::{LineBuffer, Utf8Decoder};

const EVENT_PREFIX: &str = "event: ";
const DATA_PREFIX: &str = "data: ";

/// One `data:` line paired with the event name in effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Empty when no `event:` line has been seen yet
    pub event: String,
    pub data: String,
}

/// Line-level framer
#[derive(Debug, Default)]
pub struct EventFramer {
    current_event: String,
}

impl EventFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one complete line (no trailing newline)
    pub fn feed_line(&mut self, line: &str) -> Option<SseFrame> {
        if let Some(name) = line.strip_prefix(EVENT_PREFIX) {
            self.current_event = name.trim().to_string();
            None
        } else {
            line.strip_prefix(DATA_PREFIX).map(|data| SseFrame {
                event: self.current_event.clone(),
                data: data.to_string(),
            })
        }
    }

    pub fn current_event(&self) -> &str {
        &self.current_event
    }
}

/// Bytes in, frames out: UTF-8 decoding, line splitting and framing
#[derive(Debug, Default)]
pub struct FrameDecoder {
    utf8: Utf8Decoder,
    lines: LineBuffer,
    framer: EventFramer,
    bytes_received: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.bytes_received += chunk.len();
        let text = self.utf8.decode(chunk);
        self.lines
            .push(&text)
            .iter()
            .filter_map(|line| self.framer.feed_line(line))
            .collect()
    }

    pub fn bytes_received(&self) -> usize {
        self.bytes_received
    }

    /// End of input. Returns the unterminated trailing text, which is never
    /// dispatched, or `None` when the stream ended on a line boundary.
    pub fn finish(&mut self) -> Option<String> {
        let flushed = self.utf8.finish();
        let mut tail = std::mem::take(&mut self.lines).partial().to_string();
        tail.push_str(&flushed);
        (!tail.is_empty()).then_some(tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_returns_undispatched_tail() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"event: complete\n").is_empty());
        assert!(decoder.push(b"data: {\"job_id\"").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("data: {\"job_id\""));

        // A truncated multi-byte character is flushed as U+FFFD
        let mut decoder = FrameDecoder::new();
        decoder.push(&"é".as_bytes()[..1]);
        assert_eq!(decoder.finish().as_deref(), Some("\u{FFFD}"));

        let mut decoder = FrameDecoder::new();
        decoder.push(b"event: progress\n\n");
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_event_name_applies_to_data() {
        let mut framer = EventFramer::new();
        assert_eq!(framer.feed_line("event:  progress "), None);
        assert_eq!(framer.current_event(), "progress");

        let frame = framer.feed_line(r#"data: {"percent": 5}"#).unwrap();
        assert_eq!(frame.event, "progress");
        assert_eq!(frame.data, r#"{"percent": 5}"#);
    }

    #[test]
    fn test_event_name_survives_blank_line() {
        let mut framer = EventFramer::new();
        framer.feed_line("event: progress");
        assert_eq!(framer.feed_line(""), None);
        assert_eq!(framer.feed_line("data: 1").unwrap().event, "progress");
    }

    #[test]
    fn test_unset_event_and_noise_lines() {
        let mut framer = EventFramer::new();
        assert_eq!(framer.feed_line("data: {}").unwrap().event, "");
        assert_eq!(framer.feed_line(": keep-alive"), None);
        assert_eq!(framer.feed_line("id: 7"), None);
        // Prefixes must include the space
        assert_eq!(framer.feed_line("data:{}"), None);
        assert_eq!(framer.feed_line("event:complete"), None);
        assert_eq!(framer.current_event(), "");
    }

    #[test]
    fn test_decoder_frames_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"event: comp").is_empty());
        assert!(decoder.push(b"lete\ndata: {\"job_id\"").is_empty());

        let frames = decoder.push(b":\"abc123\"}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "complete".to_string(),
                data: r#"{"job_id":"abc123"}"#.to_string(),
            }]
        );
        assert_eq!(decoder.bytes_received(), 43);
    }
}
