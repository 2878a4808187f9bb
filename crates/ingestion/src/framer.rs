//! LineFramer - reassembles newline-terminated lines from arbitrary chunks

use bytes::{Buf, BytesMut};

/// Longest line kept in memory before it is forced out
pub const DEFAULT_MAX_LINE_BYTES: usize = 4096;

/// Splits a byte stream into trimmed text lines.
///
/// A chunk may end mid-line; the tail is carried over to the next
/// [`LineFramer::push`]. CR is stripped, invalid UTF-8 is replaced with
/// U+FFFD and blank lines are dropped.
#[derive(Debug)]
pub struct LineFramer {
    pending: BytesMut,
    max_line_bytes: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl LineFramer {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            pending: BytesMut::new(),
            max_line_bytes: max_line_bytes.max(1),
        }
    }

    /// Bytes waiting for a line terminator
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Feed one chunk, returning every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw = self.pending.split_to(pos);
            self.pending.advance(1);
            push_decoded(&mut lines, &raw);
        }

        // No terminator in sight: do not grow without bound
        if self.pending.len() > self.max_line_bytes {
            let raw = self.pending.split();
            push_decoded(&mut lines, &raw);
        }

        lines
    }

    /// Flush the unterminated tail at end of stream
    pub fn finish(&mut self) -> Option<String> {
        let raw = self.pending.split();
        let mut lines = Vec::with_capacity(1);
        push_decoded(&mut lines, &raw);
        lines.pop()
    }
}

fn push_decoded(lines: &mut Vec<String>, raw: &[u8]) {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
}
