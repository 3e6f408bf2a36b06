// Chunk: docs/chunks/scope_highlighting - Row/column points and ranges

//! Row/column positions.
//!
//! Columns are UTF-8 byte columns, matching tree-sitter's `Point`. Every other
//! module orders positions through the `Ord` impl here.

use std::cmp::Ordering;

/// Position in the buffer as (row, column) where both are 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    /// Sentinel reported by an exhausted highlight iterator.
    pub const INFINITY: Point = Point {
        row: usize::MAX,
        column: usize::MAX,
    };

    pub const ZERO: Point = Point { row: 0, column: 0 };

    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    pub fn is_infinity(&self) -> bool {
        *self == Point::INFINITY
    }

    /// Moves this point forward by `extent`.
    ///
    /// A multi-row extent resets the column: `(2, 5)` traversed by `(1, 3)`
    /// lands on `(3, 3)`, while `(0, 3)` lands on `(2, 8)`.
    pub fn traverse(&self, extent: Point) -> Point {
        if extent.row == 0 {
            Point::new(self.row, self.column.saturating_add(extent.column))
        } else {
            Point::new(self.row.saturating_add(extent.row), extent.column)
        }
    }

    /// Returns the extent covered by `text`: the number of newlines it
    /// contains and the byte length of its final line.
    pub fn extent_of(text: &str) -> Point {
        let mut row = 0;
        let mut line_start = 0;
        for (i, b) in text.as_bytes().iter().enumerate() {
            if *b == b'\n' {
                row += 1;
                line_start = i + 1;
            }
        }
        Point::new(row, text.len() - line_start)
    }

    /// Distance from `start` to `self`, the inverse of [`Point::traverse`].
    pub fn traversal_from(&self, start: Point) -> Point {
        if self.row == start.row {
            Point::new(0, self.column.saturating_sub(start.column))
        } else {
            Point::new(self.row.saturating_sub(start.row), self.column)
        }
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare by row first, then by column
        match self.row.cmp(&other.row) {
            Ordering::Equal => self.column.cmp(&other.column),
            ord => ord,
        }
    }
}

impl From<tree_sitter::Point> for Point {
    fn from(point: tree_sitter::Point) -> Self {
        Point::new(point.row, point.column)
    }
}

impl From<Point> for tree_sitter::Point {
    fn from(point: Point) -> Self {
        tree_sitter::Point {
            row: point.row,
            column: point.column,
        }
    }
}

/// A half-open span between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Point,
    pub end: Point,
}

impl Range {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn extent(&self) -> Point {
        self.end.traversal_from(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when the range spans more than one row.
    pub fn is_multi_row(&self) -> bool {
        self.end.row > self.start.row
    }

    pub fn contains_point(&self, point: Point) -> bool {
        self.start <= point && point < self.end
    }
}

impl From<tree_sitter::Range> for Range {
    fn from(range: tree_sitter::Range) -> Self {
        Range::new(range.start_point.into(), range.end_point.into())
    }
}
