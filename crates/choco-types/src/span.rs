use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location span.
///
/// All line/column values are 1-based, as produced by the front-end.
/// On the wire a span is the array `[start_row, start_col, end_row, end_col]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Span covering a whole source line from column 1 up to `end_col`.
    pub fn line(line: u32, end_col: u32) -> Self {
        Self::new(line, 1, line, end_col)
    }
}

impl From<[u32; 4]> for Span {
    fn from([start_line, start_col, end_line, end_col]: [u32; 4]) -> Self {
        Self::new(start_line, start_col, end_line, end_col)
    }
}

impl From<Span> for [u32; 4] {
    fn from(span: Span) -> Self {
        [span.start_line, span.start_col, span.end_line, span.end_col]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}
