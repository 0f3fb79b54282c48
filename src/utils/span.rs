//! Source location tracking

use serde::Serialize;

/// A span represents a range in the source code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Start character offset
    pub start: usize,
    /// End character offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Merge two spans
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// 1-based line and column of the span start within `source`
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let mut line = 1;
        let mut col = 1;
        for c in source.chars().take(self.start) {
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        let a = Span::new(3, 5);
        let b = Span::new(8, 12);
        assert_eq!(a.merge(&b), Span::new(3, 12));
        assert_eq!(b.merge(&a), Span::new(3, 12));
    }

    #[test]
    fn test_line_col() {
        let source = "10 PRINT A\n20 LET B = 1\n";
        assert_eq!(Span::new(0, 2).line_col(source), (1, 1));
        assert_eq!(Span::new(14, 17).line_col(source), (2, 4));
    }
}
