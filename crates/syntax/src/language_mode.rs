// Chunk: docs/chunks/incremental_reparse - Per-document parse session

//! Per-document session tying a compiled grammar to a live parse tree.
//!
//! [`LanguageMode`] owns the tree-sitter `Parser` and `Tree` for one document,
//! a snapshot of its source and a [`LineIndex`]. Edits are applied to the
//! tree, the document is re-parsed incrementally and the ranges whose
//! syntactic structure changed are returned so the host can invalidate its
//! rendering for them.
//!
//! Highlight iterators and fold queries borrow the session; the borrow
//! checker guarantees no iterator is alive across an edit.
//!
//! ## Foldability cache
//!
//! Renderers ask "is row N foldable?" for every visible row on every frame.
//! Answers are cached per row in a `RefCell` and the cache is dropped on
//! every edit, since a re-parse can change the tree arbitrarily far from
//! the edit.

use crate::edit::TreeEdit;
use crate::error::ConfigError;
use crate::fold::FoldResolver;
use crate::highlight_iterator::HighlightIterator;
use crate::line_index::LineIndex;
use crate::point::{Point, Range};
use crate::registry::{CommentStrings, Grammar};
use std::cell::RefCell;
use std::sync::Arc;
use tree_sitter::{Node, Parser, Tree};

/// A parsed document in one language.
pub struct LanguageMode {
    grammar: Arc<Grammar>,
    parser: Parser,
    tree: Tree,
    /// Current source snapshot
    source: String,
    lines: LineIndex,
    /// `foldable_rows[row]` is `None` until the row is first queried
    foldable_rows: RefCell<Vec<Option<bool>>>,
}

impl LanguageMode {
    /// Parses `source` with the grammar.
    ///
    /// Fails if the parser rejects the grammar.
    pub fn new(grammar: Arc<Grammar>, source: impl Into<String>) -> Result<Self, ConfigError> {
        let source = source.into();
        let mut parser = Parser::new();
        parser
            .set_language(grammar.language())
            .map_err(|err| ConfigError::IncompatibleGrammar {
                language: grammar.id().to_string(),
                message: err.to_string(),
            })?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| ConfigError::IncompatibleGrammar {
                language: grammar.id().to_string(),
                message: "parser produced no tree".to_string(),
            })?;
        let lines = LineIndex::new(&source);
        tracing::debug!(language = grammar.id(), bytes = source.len(), "parsed document");

        Ok(Self {
            grammar,
            parser,
            tree,
            source,
            lines,
            foldable_rows: RefCell::new(Vec::new()),
        })
    }

    /// Applies an edit and re-parses incrementally.
    ///
    /// `new_source` is the complete text after the edit. Returns the ranges
    /// of the new tree whose structure differs from the old one.
    pub fn edit(&mut self, edit: &TreeEdit, new_source: impl Into<String>) -> Vec<Range> {
        let new_source = new_source.into();
        self.tree.edit(&edit.to_input_edit());
        self.lines.apply_edit(
            edit.start_index,
            edit.old_end_index(),
            edit.new_end_index(),
            &new_source,
        );
        self.source = new_source;
        self.reparse(true)
    }

    /// Replaces `range` with `text`, then re-parses incrementally.
    pub fn replace_range(&mut self, range: Range, text: &str) -> Vec<Range> {
        let edit = TreeEdit::replace(&self.source, &self.lines, range, text);
        let mut new_source = String::with_capacity(self.source.len() - edit.length_removed + text.len());
        new_source.push_str(&self.source[..edit.start_index]);
        new_source.push_str(text);
        new_source.push_str(&self.source[edit.old_end_index()..]);
        self.edit(&edit, new_source)
    }

    /// Replaces the whole document.
    ///
    /// This performs a full re-parse rather than incremental update.
    /// Use `edit()` when you have edit position information.
    pub fn update_source(&mut self, new_source: impl Into<String>) -> Vec<Range> {
        self.source = new_source.into();
        self.lines = LineIndex::new(&self.source);
        self.reparse(false)
    }

    fn reparse(&mut self, incremental: bool) -> Vec<Range> {
        self.foldable_rows.borrow_mut().clear();

        let old_tree = incremental.then_some(&self.tree);
        match self.parser.parse(&self.source, old_tree) {
            Some(new_tree) => {
                let changed: Vec<Range> = if incremental {
                    self.tree.changed_ranges(&new_tree).map(Range::from).collect()
                } else {
                    vec![self.document_range()]
                };
                self.tree = new_tree;
                tracing::debug!(
                    language = self.grammar.id(),
                    incremental,
                    invalidated = changed.len(),
                    "reparsed document"
                );
                changed
            }
            None => {
                // Keep the edited tree; positions are shifted but structure is stale
                tracing::warn!(language = self.grammar.id(), "reparse produced no tree");
                vec![self.document_range()]
            }
        }
    }

    fn document_range(&self) -> Range {
        Range::new(Point::ZERO, self.lines.end_point())
    }

    /// Builds a highlight iterator over the current tree, positioned at the
    /// start of the document.
    pub fn build_iterator(&self) -> HighlightIterator<'_> {
        HighlightIterator::new(&self.tree, self.grammar.scope_map(), &self.lines)
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    /// Returns the current source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// Returns the number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    /// Text of a line without its newline.
    pub fn line(&self, row: usize) -> Option<&str> {
        self.lines
            .line_range(row)
            .map(|(start, end)| &self.source[start..end])
    }

    pub fn comment_strings(&self) -> &CommentStrings {
        self.grammar.comment_strings()
    }

    // ==================== folding ====================

    fn folds(&self) -> FoldResolver<'_> {
        FoldResolver::new(self.grammar.folds(), &self.tree, &self.lines)
    }

    pub fn is_foldable_at_row(&self, row: usize) -> bool {
        if row >= self.line_count() {
            return false;
        }
        if let Some(Some(foldable)) = self.foldable_rows.borrow().get(row) {
            return *foldable;
        }

        let foldable = self.folds().fold_range_at_row(row).is_some();
        let mut cache = self.foldable_rows.borrow_mut();
        if cache.len() <= row {
            cache.resize(row + 1, None);
        }
        cache[row] = Some(foldable);
        foldable
    }

    pub fn fold_range_at_row(&self, row: usize) -> Option<Range> {
        self.folds().fold_range_at_row(row)
    }

    pub fn foldable_range_containing_point(&self, point: Point, allow_previous_rows: bool) -> Option<Range> {
        self.folds()
            .foldable_range_containing_point(point, allow_previous_rows)
    }

    pub fn foldable_ranges(&self) -> Vec<Range> {
        self.folds().foldable_ranges()
    }

    pub fn foldable_ranges_at_indent_level(&self, level: usize) -> Vec<Range> {
        self.folds().foldable_ranges_at_indent_level(level)
    }

    pub fn fold_range_for_node(&self, node: Node<'_>) -> Option<Range> {
        self.grammar.folds().fold_range_for_node(node)
    }

    // ==================== indentation ====================

    /// Indent level of `line` in units of `tab_len` columns.
    ///
    /// A tab advances to the next multiple of `tab_len`; the result is
    /// fractional when leading spaces do not fill a whole unit.
    pub fn indent_level_for_line(line: &str, tab_len: usize) -> f64 {
        let tab_len = tab_len.max(1);
        let mut indent = 0;
        for c in line.chars() {
            match c {
                '\t' => indent += tab_len - (indent % tab_len),
                ' ' => indent += 1,
                _ => break,
            }
        }
        indent as f64 / tab_len as f64
    }

    /// Suggested indent level for `row`: that of the closest non-blank row
    /// above it, or zero.
    pub fn suggested_indent_for_row(&self, row: usize, tab_len: usize) -> f64 {
        (0..row.min(self.line_count()))
            .rev()
            .filter_map(|r| self.line(r))
            .find(|line| !line.trim().is_empty())
            .map_or(0.0, |line| Self::indent_level_for_line(line, tab_len))
    }
}
