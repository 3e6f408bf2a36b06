// Chunk: docs/chunks/scope_highlighting - Byte line index for point/offset translation

//! Line index over a source snapshot.
//!
//! Tree-sitter reports both byte offsets and (row, byte column) points. The
//! highlight iterator is seeked by point, fold queries clip points to line
//! ends, and edits arrive as points; all of those go through this index.

use crate::point::Point;

/// Byte offsets where each line starts, plus the total source length.
///
/// Invariants:
/// - `line_starts[0] == 0`
/// - for i > 0, `line_starts[i]` is the byte immediately after the `\n`
///   that ended line i-1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Builds the index for `source`. O(n) over the source bytes.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.as_bytes().iter().enumerate() {
            if *b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// A buffer always has at least one line (even if empty).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn line_start(&self, row: usize) -> Option<usize> {
        self.line_starts.get(row).copied()
    }

    /// Byte range `[start, end)` of a line, excluding its trailing newline.
    pub fn line_range(&self, row: usize) -> Option<(usize, usize)> {
        let start = self.line_start(row)?;
        let end = match self.line_starts.get(row + 1) {
            Some(next) => next - 1,
            None => self.len,
        };
        Some((start, end))
    }

    /// Byte length of a line, excluding its newline.
    pub fn line_len(&self, row: usize) -> Option<usize> {
        self.line_range(row).map(|(start, end)| end - start)
    }

    /// Position of the end of the buffer.
    pub fn end_point(&self) -> Point {
        let row = self.line_count() - 1;
        Point::new(row, self.len - self.line_starts[row])
    }

    /// Clamps `point` onto the buffer: rows past the end go to the end of the
    /// buffer, columns past a line's end go to that line's end.
    pub fn clip_point(&self, point: Point) -> Point {
        match self.line_len(point.row) {
            Some(len) => Point::new(point.row, point.column.min(len)),
            None => self.end_point(),
        }
    }

    /// Byte offset of `point`, clipped to the buffer.
    pub fn offset_for_point(&self, point: Point) -> usize {
        let point = self.clip_point(point);
        self.line_starts[point.row] + point.column
    }

    /// Point at `offset`, clamped to the end of the buffer.
    pub fn point_for_offset(&self, offset: usize) -> Point {
        let offset = offset.min(self.len);
        let row = match self.line_starts.binary_search(&offset) {
            Ok(row) => row,
            Err(row) => row.saturating_sub(1),
        };
        Point::new(row, offset - self.line_starts[row])
    }

    /// Updates the index for an edit that replaced `old_start..old_end` with
    /// `new_source[old_start..new_end]`.
    ///
    /// Lines whose start is at or before the edit start are unaffected. Lines
    /// whose creating newline fell inside the removed range are dropped, new
    /// lines are added for newlines in the inserted text, and the rest shift
    /// by the length delta.
    pub fn apply_edit(&mut self, old_start: usize, old_end: usize, new_end: usize, new_source: &str) {
        let delta = new_end as isize - old_end as isize;
        let first_affected = self.line_starts.partition_point(|&off| off <= old_start);

        let mut line_starts: Vec<usize> = self.line_starts[..first_affected].to_vec();
        for (i, b) in new_source.as_bytes()[old_start..new_end].iter().enumerate() {
            if *b == b'\n' {
                line_starts.push(old_start + i + 1);
            }
        }
        for &off in &self.line_starts[first_affected..] {
            // A line at offset X was created by the newline at X-1
            if off <= old_end {
                continue;
            }
            line_starts.push((off as isize + delta) as usize);
        }

        self.line_starts = line_starts;
        self.len = new_source.len();
    }
}
