//! Accumulated shell output, searched from the tail.

use std::fmt;

use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Shell output collected since the last [`drain`](Self::drain).
///
/// Terminal escape sequences are dropped on the way in; the parser state is
/// kept between pushes, so a sequence split across two reads is still
/// dropped. Prompt searches only look at the last `window` bytes, which
/// keeps a multi-megabyte `show running-config` cheap to scan.
pub struct PatternBuffer {
    text: Vec<u8>,
    window: usize,
    escapes: Parser,
}

impl PatternBuffer {
    pub fn new(window: usize) -> Self {
        Self {
            text: Vec::with_capacity(4096),
            window,
            escapes: Parser::new(),
        }
    }

    /// Append raw bytes from the channel.
    pub fn push(&mut self, data: &[u8]) {
        self.escapes.advance(&mut PlainText(&mut self.text), data);
    }

    /// Whether `pattern` matches within the search window.
    pub fn tail_matches(&self, pattern: &Regex) -> bool {
        let start = self.text.len().saturating_sub(self.window);
        pattern.is_match(&self.text[start..])
    }

    /// Hand over everything collected and start empty.
    pub fn drain(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.text)
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.text.len())
            .field("window", &self.window)
            .finish()
    }
}

/// Keeps printable text, newlines, carriage returns and tabs.
struct PlainText<'a>(&'a mut Vec<u8>);

impl Perform for PlainText<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.0.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pushed(chunks: &[&[u8]]) -> Vec<u8> {
        let mut buffer = PatternBuffer::new(100);
        for chunk in chunks {
            buffer.push(chunk);
        }
        buffer.drain()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(pushed(&[b"show clock"]), b"show clock");
    }

    #[test]
    fn test_colors_removed() {
        assert_eq!(pushed(&[b"\x1b[1;32mup\x1b[0m"]), b"up");
    }

    #[test]
    fn test_escape_split_across_reads() {
        assert_eq!(pushed(&[b"Gi0/1 \x1b[3", b"1mdown"]), b"Gi0/1 down");
    }

    #[test]
    fn test_line_control_kept_bell_dropped() {
        assert_eq!(pushed(&[b"a\r\nb\tc\n\x07router#"]), b"a\r\nb\tc\nrouter#");
    }

    #[test]
    fn test_match_only_in_window() {
        let prompt = Regex::new(r"router#$").unwrap();

        let mut buffer = PatternBuffer::new(16);
        buffer.push(&[b'x'; 200]);
        buffer.push(b"\nrouter#");
        assert!(buffer.tail_matches(&prompt));

        let mut buffer = PatternBuffer::new(16);
        buffer.push(b"router#");
        buffer.push(&[b'x'; 200]);
        assert!(!buffer.tail_matches(&prompt));
    }

    #[test]
    fn test_drain_resets() {
        let mut buffer = PatternBuffer::new(100);
        buffer.push(b"abc");
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.drain(), b"abc");
        assert!(buffer.is_empty());
    }
}
