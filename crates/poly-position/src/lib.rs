//! Source positions and spans for the Poly lexer and parser.
//!
//! Every token and AST node carries a [`Span`] of two [`Position`]s. Lines and
//! columns are 1-based; byte offsets index into the original UTF-8 source.
//! [`LineStarts`] provides O(log n) byte-offset to line/column mapping so the
//! lexer can stamp positions without rescanning the source per token.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

/// A single point in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number
    pub line: u32,
    /// 1-based column number (in characters)
    pub column: u32,
    /// 0-based byte offset into the source
    pub byte: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, column: u32, byte: usize) -> Self {
        Position { line, column, byte }
    }

    /// The position of the very first character of a source file.
    pub fn start_of_input() -> Self {
        Position { line: 1, column: 1, byte: 0 }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::start_of_input()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A half-open region of source text, `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Position of the first byte
    pub start: Position,
    /// Position one past the last byte
    pub end: Position,
}

impl Span {
    /// Create a new span.
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// A zero-width span at a single position.
    pub fn point(at: Position) -> Self {
        Span { start: at, end: at }
    }

    /// Join two spans, producing the smallest span that covers both.
    pub fn to(self, other: Span) -> Span {
        Span { start: self.start, end: other.end }
    }

    /// Byte length of the span.
    pub fn len(&self) -> usize {
        self.end.byte.saturating_sub(self.start.byte)
    }

    /// Whether the span covers zero bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache of line-start byte offsets for a source text.
///
/// Built once per input; `position_at` then resolves any byte offset to a
/// 1-based line/column pair with a binary search over the line table.
#[derive(Debug, Clone)]
pub struct LineStarts {
    starts: Vec<usize>,
}

impl LineStarts {
    /// Scan `source` and record the byte offset of each line start.
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        LineStarts { starts }
    }

    /// Resolve a byte offset to a full position.
    ///
    /// Column counts characters, not bytes, so multi-byte identifiers report
    /// the column a reader would expect.
    pub fn position_at(&self, source: &str, byte: usize) -> Position {
        let byte = byte.min(source.len());
        let line_idx = match self.starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.starts[line_idx];
        let column = source[line_start..byte].chars().count() as u32 + 1;
        Position { line: line_idx as u32 + 1, column, byte }
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}
