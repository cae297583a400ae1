use anyhow::Result;
use std::collections::VecDeque;

/// Byte buffer that yields complete `\n`-terminated lines
///
/// Partial lines stay buffered until the rest arrives, so multi-byte UTF-8
/// sequences split across network chunks decode correctly.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Next complete line with surrounding whitespace (including `\r`) trimmed
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        match String::from_utf8(line_bytes) {
            Ok(line) => Some(Ok(line.trim().to_string())),
            Err(e) => Some(Err(anyhow::anyhow!("Invalid UTF-8 in stream: {}", e))),
        }
    }

    /// Whatever is left once the stream ends without a trailing newline
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let bytes: Vec<u8> = self.buffer.drain(..).collect();
        let line = String::from_utf8_lossy(&bytes).trim().to_string();
        (!line.is_empty()).then_some(line)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_lines() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        buffer.extend(b"data: a\r\ndata: b\n");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: a");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: b");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_split_utf8_sequence() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        let bytes = "olá\n".as_bytes();

        buffer.extend(&bytes[..3]);
        assert!(buffer.next_line().is_none());

        buffer.extend(&bytes[3..]);
        assert_eq!(buffer.next_line().unwrap().unwrap(), "olá");
    }

    #[test]
    fn test_remainder() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        buffer.extend(b"data: tail");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.take_remainder().as_deref(), Some("data: tail"));
        assert!(buffer.take_remainder().is_none());
    }
}
