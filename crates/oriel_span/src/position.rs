//! Positions and ranges in analyzed sources.

use serde::Serialize;

use crate::ResolvedUrl;

/// A zero-based line/column location in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourcePosition {
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based column number, in bytes from the line start.
    pub column: u32,
}

impl SourcePosition {
    /// Create a new position.
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // One-based for humans.
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// A contiguous region of a source file.
///
/// Ranges produced for inline documents are always expressed in the host
/// file's coordinates (see [`crate::LocationOffset`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceRange {
    /// URL of the file this range points into.
    pub file: ResolvedUrl,
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceRange {
    /// Create a new range.
    #[inline]
    pub fn new(file: ResolvedUrl, start: SourcePosition, end: SourcePosition) -> Self {
        Self { file, start, end }
    }

    /// True when the range spans zero characters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(SourcePosition::new(0, 5) < SourcePosition::new(1, 0));
        assert!(SourcePosition::new(2, 3) < SourcePosition::new(2, 4));
    }

    #[test]
    fn test_position_display_is_one_based() {
        assert_eq!(SourcePosition::new(0, 0).to_string(), "1:1");
        assert_eq!(SourcePosition::new(4, 10).to_string(), "5:11");
    }

    #[test]
    fn test_range_is_empty() {
        let file = ResolvedUrl::from("a.html");
        let range = SourceRange::new(
            file.clone(),
            SourcePosition::new(1, 2),
            SourcePosition::new(1, 2),
        );
        assert!(range.is_empty());
        let range = SourceRange::new(file, SourcePosition::new(1, 2), SourcePosition::new(1, 3));
        assert!(!range.is_empty());
    }
}
