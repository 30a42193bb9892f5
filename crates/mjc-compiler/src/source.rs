//! Source coordinates.
//!
//! Tokens are lexed with byte spans; a [`LineIndex`] converts offsets into
//! the 1-based line/column pairs that AST nodes and diagnostics carry.

use serde::Serialize;

/// A 1-based (line, column) pair, printed `line:column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coord {
    pub line: u32,
    pub column: u32,
}

impl Coord {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Byte offsets of line starts, for offset/coordinate conversion.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    pub fn coord_at(&self, offset: usize) -> Coord {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let column = offset - self.line_starts[line] + 1;
        Coord::new(line as u32 + 1, column as u32)
    }

    /// Byte offset of a coordinate, for snippet rendering.
    pub fn offset_of(&self, coord: Coord) -> usize {
        let line = (coord.line as usize).saturating_sub(1);
        let start = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or_else(|| *self.line_starts.last().unwrap_or(&0));
        start + (coord.column as usize).saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_are_one_based() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.coord_at(0), Coord::new(1, 1));
        assert_eq!(index.coord_at(1), Coord::new(1, 2));
        assert_eq!(index.coord_at(3), Coord::new(2, 1));
        assert_eq!(index.coord_at(4), Coord::new(2, 2));
    }

    #[test]
    fn offsets_round_trip() {
        let source = "class A {\n  int n;\n}\n";
        let index = LineIndex::new(source);
        for offset in [0, 6, 10, 12, 19] {
            assert_eq!(index.offset_of(index.coord_at(offset)), offset);
        }
    }
}
