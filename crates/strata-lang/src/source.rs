//! Source positions and ranges for configuration diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a source file.
///
/// `line` and `column` are 1-based; `byte` is a 0-based offset into the
/// file's bytes. The three fields always describe the same location, so
/// positions compare consistently whichever field is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
    pub byte: usize,
}

impl Pos {
    pub const fn new(line: usize, column: usize, byte: usize) -> Self {
        Self { line, column, byte }
    }
}

/// A contiguous span in a named source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub filename: String,
    pub start: Pos,
    pub end: Pos,
}

impl Range {
    pub fn new(filename: impl Into<String>, start: Pos, end: Pos) -> Self {
        Self {
            filename: filename.into(),
            start,
            end,
        }
    }

    /// A range with no position information, used when only the file is
    /// known.
    pub fn unknown(filename: impl Into<String>) -> Self {
        Self::new(filename, Pos::new(0, 0, 0), Pos::new(0, 0, 0))
    }

    /// True when the range covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start.byte == self.end.byte
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(
                f,
                "{}:{},{}-{}",
                self.filename, self.start.line, self.start.column, self.end.column
            )
        } else {
            write!(
                f,
                "{}:{},{}-{},{}",
                self.filename, self.start.line, self.start.column, self.end.line, self.end.column
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_ordering_follows_line_then_column() {
        let a = Pos::new(1, 1, 0);
        let b = Pos::new(1, 5, 4);
        let c = Pos::new(2, 1, 10);

        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
    }

    #[test]
    fn display_single_line() {
        let range = Range::new("main.tf.yaml", Pos::new(3, 1, 20), Pos::new(3, 9, 28));
        assert_eq!(range.to_string(), "main.tf.yaml:3,1-9");
    }

    #[test]
    fn display_multi_line() {
        let range = Range::new("main.tf.yaml", Pos::new(1, 1, 0), Pos::new(2, 4, 12));
        assert_eq!(range.to_string(), "main.tf.yaml:1,1-2,4");
    }

    #[test]
    fn unknown_range_is_empty() {
        assert!(Range::unknown("x.yaml").is_empty());
    }

    #[test]
    fn serialization_round_trip() {
        let range = Range::new("a.yaml", Pos::new(1, 2, 1), Pos::new(1, 6, 5));
        let json = serde_json::to_string(&range).unwrap();
        let back: Range = serde_json::from_str(&json).unwrap();
        assert_eq!(range, back);
    }
}
