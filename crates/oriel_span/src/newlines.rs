//! Offset↔position translation.

use crate::SourcePosition;

/// Index of every `\n` in a source text.
///
/// Built once per parsed document and immutable afterwards. Translation in
/// both directions is O(log n) and round-trips exactly for every valid
/// offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewlineIndex {
    newlines: Vec<u32>,
    len: u32,
}

impl NewlineIndex {
    /// Scan `contents` and record the offset of every newline.
    pub fn new(contents: &str) -> Self {
        let newlines = contents
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i as u32)
            .collect();
        Self {
            newlines,
            len: contents.len() as u32,
        }
    }

    /// Length of the indexed text, in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Translate a byte offset into a line/column position.
    ///
    /// Offsets past the end of the text clamp to the final position.
    pub fn offset_to_position(&self, offset: usize) -> SourcePosition {
        let offset = offset.min(self.len as usize) as u32;
        let line = self.newlines.partition_point(|&nl| nl < offset) as u32;
        let line_start = if line == 0 {
            0
        } else {
            self.newlines[line as usize - 1] + 1
        };
        SourcePosition::new(line, offset - line_start)
    }

    /// Translate a line/column position back into a byte offset.
    ///
    /// Returns `None` when the line does not exist or the column runs past
    /// the end of the line.
    pub fn position_to_offset(&self, position: SourcePosition) -> Option<usize> {
        let line = position.line as usize;
        let line_start = if line == 0 {
            0
        } else {
            *self.newlines.get(line - 1)? + 1
        };
        let line_end = self
            .newlines
            .get(line)
            .copied()
            .unwrap_or(self.len);
        let offset = line_start + position.column;
        (offset <= line_end).then_some(offset as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        let index = NewlineIndex::new("");
        assert_eq!(index.offset_to_position(0), SourcePosition::new(0, 0));
        assert_eq!(index.position_to_offset(SourcePosition::new(0, 0)), Some(0));
        assert_eq!(index.position_to_offset(SourcePosition::new(1, 0)), None);
    }

    #[test]
    fn test_offset_to_position() {
        let index = NewlineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.offset_to_position(0), SourcePosition::new(0, 0));
        assert_eq!(index.offset_to_position(2), SourcePosition::new(0, 2));
        assert_eq!(index.offset_to_position(3), SourcePosition::new(1, 0));
        assert_eq!(index.offset_to_position(5), SourcePosition::new(1, 2));
        assert_eq!(index.offset_to_position(6), SourcePosition::new(2, 0));
        assert_eq!(index.offset_to_position(7), SourcePosition::new(3, 0));
        assert_eq!(index.offset_to_position(9), SourcePosition::new(3, 2));
    }

    #[test]
    fn test_round_trip_every_offset() {
        let text = "line one\nline two\n\nend";
        let index = NewlineIndex::new(text);
        for offset in 0..=text.len() {
            let position = index.offset_to_position(offset);
            assert_eq!(index.position_to_offset(position), Some(offset));
        }
    }

    #[test]
    fn test_column_past_line_end_rejected() {
        let index = NewlineIndex::new("ab\ncd");
        assert_eq!(index.position_to_offset(SourcePosition::new(0, 2)), Some(2));
        assert_eq!(index.position_to_offset(SourcePosition::new(0, 3)), None);
        assert_eq!(index.position_to_offset(SourcePosition::new(1, 2)), Some(5));
        assert_eq!(index.position_to_offset(SourcePosition::new(1, 3)), None);
    }
}
