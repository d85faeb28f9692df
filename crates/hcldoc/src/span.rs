//! source locations
use std::fmt;

/// A point in the source text
///
/// `line` and `column` are 1-based and count characters, `offset` is the byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_new::new)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A range of the source text: where it starts and how many bytes it covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, derive_new::new)]
pub struct Span {
    pub start: Position,
    pub length: usize,
}

impl Span {
    pub fn line(&self) -> usize {
        self.start.line
    }

    pub fn column(&self) -> usize {
        self.start.column
    }

    pub fn offset(&self) -> usize {
        self.start.offset
    }

    /// Byte offset right after the span
    pub fn end(&self) -> usize {
        self.start.offset + self.length
    }

    /// Span starting at `self` and ending where `other` ends
    pub fn to(&self, other: Span) -> Span {
        Span {
            start: self.start,
            length: other.end().saturating_sub(self.start.offset),
        }
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.offset()..self.end()]
    }
}
