//! Byte cursor for input navigation

use crate::error::Pos;

/// Cursor over markup bytes with line/column tracking
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    /// Create cursor from byte slice
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Get current byte without consuming
    pub fn current(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peek at byte ahead without consuming
    pub fn peek(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.pos.saturating_add(ahead)).copied()
    }

    /// Advance cursor by one byte
    pub fn advance(&mut self) {
        if let Some(b) = self.current() {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else if b & 0xC0 != 0x80 {
                // continuation bytes do not start a new column
                self.col += 1;
            }
        }
    }

    /// Advance cursor by `n` bytes, stopping at end of input
    pub fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Consume a single line break (`\n` or `\r\n`) if one is next
    pub fn consume_line_break(&mut self) -> bool {
        if self.starts_with(b"\r\n") {
            self.advance_by(2);
            true
        } else if self.current() == Some(b'\n') {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Whether the remaining input starts with `prefix`
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.remaining().starts_with(prefix)
    }

    /// Whether the remaining input starts with `prefix`, ignoring ASCII case
    pub fn starts_with_ignore_case(&self, prefix: &[u8]) -> bool {
        self.remaining()
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    }

    /// Offset of `pattern` from the current position, searching from `skip`
    pub fn find(&self, pattern: &[u8], skip: usize) -> Option<usize> {
        let haystack = self.remaining().get(skip..)?;
        if pattern.is_empty() {
            return Some(skip);
        }
        haystack
            .windows(pattern.len())
            .position(|window| window == pattern)
            .map(|idx| idx + skip)
    }

    /// Get current position
    pub const fn position(&self) -> Pos {
        Pos::new(self.pos, self.line, self.col)
    }

    /// Check if at end of input
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> &'a [u8] {
        self.input.get(self.pos..).unwrap_or_default()
    }

    /// Get current position index
    pub const fn pos(&self) -> usize {
        self.pos
    }
}
