// Chunk: docs/chunks/incremental_reparse - Edit descriptors for incremental reparsing

//! Edit descriptors handed to the parser before an incremental reparse.
//!
//! A [`TreeEdit`] describes one replacement in the shape hosts usually emit
//! it: a start (as a byte index and a point), how much was removed and how
//! much was added, each as a byte length and a row/column extent. Tree-sitter
//! wants absolute end positions instead; [`TreeEdit::to_input_edit`] does the
//! translation.

use crate::line_index::LineIndex;
use crate::point::{Point, Range};

/// One text replacement, in byte and point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEdit {
    /// Byte offset where the edit starts
    pub start_index: usize,
    /// Bytes removed from the old text
    pub length_removed: usize,
    /// Bytes inserted in their place
    pub length_added: usize,
    /// Point where the edit starts
    pub start_position: Point,
    /// Rows and final-row columns covered by the removed text
    pub extent_removed: Point,
    /// Rows and final-row columns covered by the inserted text
    pub extent_added: Point,
}

impl TreeEdit {
    /// Describes replacing `old_text` with `new_text` at the given start.
    pub fn for_change(start_index: usize, start_position: Point, old_text: &str, new_text: &str) -> Self {
        Self {
            start_index,
            length_removed: old_text.len(),
            length_added: new_text.len(),
            start_position,
            extent_removed: Point::extent_of(old_text),
            extent_added: Point::extent_of(new_text),
        }
    }

    /// Describes replacing `range` of `source` with `text`.
    ///
    /// `lines` must index `source`. The range is clipped to the document,
    /// and a column inside a multibyte character snaps back to its start.
    pub fn replace(source: &str, lines: &LineIndex, range: Range, text: &str) -> Self {
        let start = floor_char_boundary(source, lines.offset_for_point(range.start));
        let end = floor_char_boundary(source, lines.offset_for_point(range.end)).max(start);
        Self::for_change(start, lines.point_for_offset(start), &source[start..end], text)
    }

    /// Describes inserting `text` at `at`.
    pub fn insert(source: &str, lines: &LineIndex, at: Point, text: &str) -> Self {
        Self::replace(source, lines, Range::new(at, at), text)
    }

    /// Describes deleting `range`.
    pub fn delete(source: &str, lines: &LineIndex, range: Range) -> Self {
        Self::replace(source, lines, range, "")
    }

    pub fn old_end_index(&self) -> usize {
        self.start_index + self.length_removed
    }

    pub fn new_end_index(&self) -> usize {
        self.start_index + self.length_added
    }

    pub fn old_end_position(&self) -> Point {
        self.start_position.traverse(self.extent_removed)
    }

    pub fn new_end_position(&self) -> Point {
        self.start_position.traverse(self.extent_added)
    }

    /// Converts this edit to a tree-sitter `InputEdit`.
    pub fn to_input_edit(&self) -> tree_sitter::InputEdit {
        tree_sitter::InputEdit {
            start_byte: self.start_index,
            old_end_byte: self.old_end_index(),
            new_end_byte: self.new_end_index(),
            start_position: self.start_position.into(),
            old_end_position: self.old_end_position().into(),
            new_end_position: self.new_end_position().into(),
        }
    }
}

fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
