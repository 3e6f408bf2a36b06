// Chunk: docs/chunks/tree_folding - Declarative fold rules over tree-sitter nodes

//! Fold ranges derived from delimiter and token rules.
//!
//! A [`FoldConfig`] is an ordered list of delimiter rules (a node whose first
//! child is `open` and last child is `close` folds between them) and token
//! rules (a leaf of a given type folds inside its own span, trimmed by a
//! number of columns on each side). Rules are consulted in order and the
//! first one that matches decides the fold; later rules are never consulted,
//! even if they would be more specific.
//!
//! The JSON shape, shared with language definitions, is:
//!
//! ```json
//! {
//!   "delimiters": [["{", "}"], ["(", ")", {"afterChildCount": 1}]],
//!   "tokens": [["comment", 2, 2]]
//! }
//! ```

use crate::error::ConfigError;
use crate::line_index::LineIndex;
use crate::point::{Point, Range};
use serde::Deserialize;
use serde_json::Value;
use tree_sitter::{Node, Tree};

/// Fold a node whose first and last children are the given token types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterRule {
    pub open: String,
    pub close: String,
    pub options: Option<FoldOptions>,
}

/// Moves the start of a delimiter fold past leading children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FoldOptions {
    /// Index of the child whose end starts the fold.
    pub after_child_count: Option<usize>,
    /// Start the fold after the first child of this type, searching from
    /// `after_child_count`.
    pub after_type: Option<String>,
}

/// Fold a leaf token inside its own span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRule {
    pub node_type: String,
    pub start_trim: usize,
    pub end_trim: usize,
}

impl DelimiterRule {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
            options: None,
        }
    }

    pub fn after_child_count(mut self, count: usize) -> Self {
        self.options.get_or_insert_with(FoldOptions::default).after_child_count = Some(count);
        self
    }

    pub fn after_type(mut self, node_type: impl Into<String>) -> Self {
        self.options.get_or_insert_with(FoldOptions::default).after_type = Some(node_type.into());
        self
    }
}

impl TokenRule {
    pub fn new(node_type: impl Into<String>, start_trim: usize, end_trim: usize) -> Self {
        Self {
            node_type: node_type.into(),
            start_trim,
            end_trim,
        }
    }
}

/// Ordered fold rules for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawFoldConfig")]
pub struct FoldConfig {
    delimiters: Vec<DelimiterRule>,
    tokens: Vec<TokenRule>,
}

impl FoldConfig {
    pub fn new(delimiters: Vec<DelimiterRule>, tokens: Vec<TokenRule>) -> Self {
        Self { delimiters, tokens }
    }

    pub fn delimiters(&self) -> &[DelimiterRule] {
        &self.delimiters
    }

    pub fn tokens(&self) -> &[TokenRule] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.delimiters.is_empty() && self.tokens.is_empty()
    }

    /// Checks every rule names a node type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.delimiters {
            let name = || format!("[{:?}, {:?}]", rule.open, rule.close);
            if rule.open.is_empty() || rule.close.is_empty() {
                return Err(ConfigError::fold_rule(name(), "delimiter types must not be empty"));
            }
            if let Some(FoldOptions {
                after_type: Some(after_type),
                ..
            }) = &rule.options
            {
                if after_type.is_empty() {
                    return Err(ConfigError::fold_rule(name(), "afterType must not be empty"));
                }
            }
        }
        for rule in &self.tokens {
            if rule.node_type.is_empty() {
                return Err(ConfigError::fold_rule(
                    format!("[\"\", {}, {}]", rule.start_trim, rule.end_trim),
                    "token type must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Computes the fold range for a single node, if any rule applies.
    ///
    /// Nodes with children are matched against the delimiter rules by their
    /// first and last child (anonymous tokens included). Leaves are matched
    /// against the token rules by type.
    pub fn fold_range_for_node(&self, node: Node<'_>) -> Option<Range> {
        let child_count = node.child_count();
        if child_count == 0 {
            return self.token_fold(node);
        }

        let first = node.child(0)?;
        let last = node.child(child_count - 1)?;
        let rule = self
            .delimiters
            .iter()
            .find(|rule| first.kind() == rule.open && last.kind() == rule.close)?;

        let preceding = match &rule.options {
            None => first,
            Some(options) => child_preceding_fold(node, options)?,
        };
        let boundary = match preceding.child_count() {
            0 => preceding,
            n => preceding.child(n - 1)?,
        };

        Some(Range::new(
            boundary.end_position().into(),
            last.start_position().into(),
        ))
    }

    fn token_fold(&self, node: Node<'_>) -> Option<Range> {
        let rule = self.tokens.iter().find(|rule| node.kind() == rule.node_type)?;
        let mut start: Point = node.start_position().into();
        let mut end: Point = node.end_position().into();
        start.column += rule.start_trim;
        end.column = end.column.saturating_sub(rule.end_trim);
        Some(Range::new(start, end))
    }
}

fn child_preceding_fold<'tree>(node: Node<'tree>, options: &FoldOptions) -> Option<Node<'tree>> {
    let mut index = options.after_child_count.unwrap_or(0);
    if let Some(after_type) = &options.after_type {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .enumerate()
            .skip(index)
            .find(|(_, child)| child.kind() == after_type);
        if let Some((i, _)) = found {
            index = i;
        }
    }
    node.child(index)
}

/// Row-oriented fold queries over one tree snapshot.
pub struct FoldResolver<'a> {
    config: &'a FoldConfig,
    tree: &'a Tree,
    lines: &'a LineIndex,
}

impl<'a> FoldResolver<'a> {
    pub fn new(config: &'a FoldConfig, tree: &'a Tree, lines: &'a LineIndex) -> Self {
        Self { config, tree, lines }
    }

    /// The fold that starts on `row`, if any.
    pub fn fold_range_at_row(&self, row: usize) -> Option<Range> {
        if row >= self.lines.line_count() {
            return None;
        }
        let range = self.foldable_range_containing_point(Point::new(row, usize::MAX), false);
        tracing::trace!(row, foldable = range.is_some(), "fold query");
        range
    }

    /// Finds the innermost foldable node around `point`.
    ///
    /// Starts from the smallest node at the (clipped) point and walks up
    /// through its ancestors. Nodes that end on the point's row are skipped
    /// since folding them would not hide a line. Unless `allow_previous_rows`
    /// is set, the walk stops at the first ancestor starting on an earlier
    /// row.
    pub fn foldable_range_containing_point(&self, point: Point, allow_previous_rows: bool) -> Option<Range> {
        let point = self.lines.clip_point(point);
        let ts_point = point.into();
        let mut node = self
            .tree
            .root_node()
            .descendant_for_point_range(ts_point, ts_point);

        while let Some(current) = node {
            if !allow_previous_rows && current.start_position().row < point.row {
                break;
            }
            if current.end_position().row > point.row {
                if let Some(range) = self.config.fold_range_for_node(current) {
                    return Some(range);
                }
            }
            node = current.parent();
        }

        None
    }

    /// Every foldable range in the document, sorted by start row.
    pub fn foldable_ranges(&self) -> Vec<Range> {
        self.collect_foldable_ranges(None)
    }

    /// Foldable ranges nested exactly `level` folds deep.
    pub fn foldable_ranges_at_indent_level(&self, level: usize) -> Vec<Range> {
        self.collect_foldable_ranges(Some(level))
    }

    fn collect_foldable_ranges(&self, goal_level: Option<usize>) -> Vec<Range> {
        let mut result: Vec<Range> = Vec::new();
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        let mut stack = vec![(root, 0usize)];

        while let Some((node, level)) = stack.pop() {
            let start_row = node.start_position().row;
            let end_row = node.end_position().row;

            let mut child_level = level;
            if let Some(range) = self.config.fold_range_for_node(node) {
                if goal_level.map_or(true, |goal| goal == level) {
                    match result
                        .iter_mut()
                        .find(|r| r.start.row == range.start.row && r.end.row == range.end.row)
                    {
                        Some(existing) => *existing = range,
                        None => result.push(range),
                    }
                }
                child_level += 1;
            }

            for child in node.named_children(&mut cursor) {
                let child_start_row = child.start_position().row;
                let child_end_row = child.end_position().row;
                if child_end_row <= child_start_row {
                    continue;
                }
                // Wrappers spanning the same rows as their parent keep its level
                if child_start_row == start_row && child_end_row == end_row {
                    stack.push((child, level));
                } else if goal_level.map_or(true, |goal| child_level <= goal) {
                    stack.push((child, child_level));
                }
            }
        }

        result.sort_by_key(|range| range.start.row);
        result
    }
}

// ==================== JSON decoding ====================

#[derive(Deserialize)]
struct RawFoldConfig {
    #[serde(default)]
    delimiters: Vec<Vec<Value>>,
    #[serde(default)]
    tokens: Vec<Vec<Value>>,
}

impl TryFrom<RawFoldConfig> for FoldConfig {
    type Error = ConfigError;

    fn try_from(raw: RawFoldConfig) -> Result<Self, Self::Error> {
        let delimiters = raw
            .delimiters
            .into_iter()
            .map(delimiter_from_json)
            .collect::<Result<Vec<_>, _>>()?;
        let tokens = raw
            .tokens
            .into_iter()
            .map(token_from_json)
            .collect::<Result<Vec<_>, _>>()?;

        let config = FoldConfig::new(delimiters, tokens);
        config.validate()?;
        Ok(config)
    }
}

fn delimiter_from_json(entry: Vec<Value>) -> Result<DelimiterRule, ConfigError> {
    let rule = Value::Array(entry.clone()).to_string();
    match entry.as_slice() {
        [Value::String(open), Value::String(close)] => Ok(DelimiterRule::new(open, close)),
        [Value::String(open), Value::String(close), options] => {
            let options = FoldOptions::deserialize(options)
                .map_err(|err| ConfigError::fold_rule(rule.as_str(), err.to_string()))?;
            Ok(DelimiterRule {
                open: open.clone(),
                close: close.clone(),
                options: Some(options),
            })
        }
        _ => Err(ConfigError::fold_rule(
            rule,
            "expected [openType, closeType] or [openType, closeType, options]",
        )),
    }
}

fn token_from_json(entry: Vec<Value>) -> Result<TokenRule, ConfigError> {
    let rule = Value::Array(entry.clone()).to_string();
    match entry.as_slice() {
        [Value::String(node_type), start_trim, end_trim] => {
            match (start_trim.as_u64(), end_trim.as_u64()) {
                (Some(start_trim), Some(end_trim)) => {
                    Ok(TokenRule::new(node_type, start_trim as usize, end_trim as usize))
                }
                _ => Err(ConfigError::fold_rule(rule, "trims must be non-negative integers")),
            }
        }
        _ => Err(ConfigError::fold_rule(rule, "expected [tokenType, startTrim, endTrim]")),
    }
}
