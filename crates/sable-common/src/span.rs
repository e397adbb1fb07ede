//! Source location tracking.
//!
//! Spans are byte offsets into a single source text. Diagnostics are rendered
//! with 1-based line/column positions computed through a `LineMap`.

use serde::Serialize;

/// A half-open byte range into a source text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub len: u32,
}

impl Span {
    pub const fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    /// Zero-length span at a position. Used for synthesized nodes.
    pub const fn empty(start: u32) -> Self {
        Self { start, len: 0 }
    }

    pub const fn end(self) -> u32 {
        self.start + self.len
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Span {
            start,
            len: end - start,
        }
    }

    pub fn contains(self, offset: u32) -> bool {
        offset >= self.start && offset < self.end()
    }
}

/// A 1-based line/column position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Maps byte offsets to line/column positions.
///
/// Built once per source text; lookups are a binary search over the recorded
/// line-start offsets.
#[derive(Clone, Debug)]
pub struct LineMap {
    /// Byte offset of the start of each line. `line_starts[0] == 0` always.
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 1-based position.
    ///
    /// Offsets past the end of the text land on the last line.
    pub fn position(&self, offset: u32) -> Position {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Position {
            line: line_index as u32 + 1,
            column: offset - self.line_starts[line_index] + 1,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
#[path = "../tests/span_tests.rs"]
mod tests;
