// Chunk: docs/chunks/scope_highlighting - Document-order scope boundary iterator

//! Scope boundary iteration over a syntax tree.
//!
//! [`HighlightIterator`] walks the tree in document order and stops at every
//! byte offset where the set of open scopes changes. At each stop the caller
//! reads the scopes that closed and the scopes that opened there; between two
//! stops the scope stack is constant, so the text in between can be rendered
//! with a single style.
//!
//! The iterator keeps two parallel stacks while it walks: the types of the
//! nodes it is inside and each node's index among its parent's children.
//! Those stacks are exactly what [`ScopeMap::get_id`] needs, so scopes are
//! resolved on the fly as nodes are entered and left. Every node, scoped or
//! not, is pushed when entered and popped when left, which keeps close tags
//! in strict reverse order of their opens.
//!
//! Zero-width nodes (missing tokens inserted by error recovery) are never
//! entered.
//!
//! The iterator borrows the tree, so it cannot outlive an edit of the
//! document that owns it. Build a fresh one after every edit.

use crate::line_index::LineIndex;
use crate::point::Point;
use crate::scope_map::{ScopeId, ScopeMap};
use tree_sitter::{Node, Tree};

/// Forward iterator over scope boundaries with random-access seek.
pub struct HighlightIterator<'a> {
    tree: &'a Tree,
    scope_map: &'a ScopeMap,
    lines: &'a LineIndex,
    /// Node the walk is at. `None` once the tree is exhausted.
    node: Option<Node<'a>>,
    /// Whether `node` has been entered (is on the stacks) or still lies ahead.
    node_open: bool,
    /// Index of `node` among its parent's children.
    child_index: usize,
    types: Vec<&'static str>,
    child_indices: Vec<usize>,
    offset: usize,
    position: Point,
    open_ids: Vec<ScopeId>,
    close_ids: Vec<ScopeId>,
}

impl<'a> HighlightIterator<'a> {
    /// Creates an iterator positioned at the start of the document.
    ///
    /// The open tags of the first boundary are already available.
    pub fn new(tree: &'a Tree, scope_map: &'a ScopeMap, lines: &'a LineIndex) -> Self {
        let mut iter = Self {
            tree,
            scope_map,
            lines,
            node: None,
            node_open: false,
            child_index: 0,
            types: Vec::new(),
            child_indices: Vec::new(),
            offset: 0,
            position: Point::ZERO,
            open_ids: Vec::new(),
            close_ids: Vec::new(),
        };
        iter.seek_offset(0);
        iter
    }

    /// Repositions the iterator at `point` (clipped to the document).
    ///
    /// Nodes that start exactly at the point are reported as open tags.
    /// Returns the scopes of nodes that started earlier and are still open
    /// at the point, outermost first, so a caller can seed its scope stack.
    /// Nodes ending at the point count as already closed.
    pub fn seek(&mut self, point: Point) -> Vec<&'a str> {
        let offset = self.lines.offset_for_point(point);
        self.seek_offset(offset)
    }

    /// Like [`HighlightIterator::seek`], addressed by byte offset.
    pub fn seek_offset(&mut self, offset: usize) -> Vec<&'a str> {
        let offset = offset.min(self.lines.len());
        self.types.clear();
        self.child_indices.clear();
        self.open_ids.clear();
        self.close_ids.clear();
        self.offset = offset;
        self.position = self.lines.point_for_offset(offset);

        let mut containing = Vec::new();
        let root = self.tree.root_node();
        self.child_index = 0;
        self.node = None;
        self.node_open = false;

        // The root spans only the text between leading and trailing padding
        if is_empty(root) || root.end_byte() <= offset {
            tracing::trace!(offset, "highlight seek past root");
            return containing;
        }
        if root.start_byte() > offset {
            self.node = Some(root);
            tracing::trace!(offset, "highlight seek before root");
            return containing;
        }

        let mut node = root;
        loop {
            self.node = Some(node);
            self.node_open = true;
            self.push_node(node);
            if let Some(id) = self.scope_for(node) {
                if node.start_byte() == offset {
                    self.open_ids.push(id);
                } else {
                    containing.extend(self.scope_map.scope_name(id));
                }
            }

            let mut cursor = node.walk();
            let next = node
                .children(&mut cursor)
                .enumerate()
                .find(|(_, child)| !is_empty(*child) && child.end_byte() > offset);
            let Some((index, child)) = next else {
                break;
            };

            self.child_index = index;
            if child.start_byte() > offset {
                // The offset sits in a gap before this child
                self.node = Some(child);
                self.node_open = false;
                break;
            }
            node = child;
        }

        tracing::trace!(offset, containing = containing.len(), "highlight seek");
        containing
    }

    /// Advances to the next position where scopes open or close.
    ///
    /// Positions with no scope change are passed over, so every `true`
    /// return has at least one open or close tag and a position beyond the
    /// previous one. Returns `false` once the tree is exhausted and keeps
    /// returning `false`, with [`Point::INFINITY`] as the position, on every
    /// later call.
    pub fn move_to_successor(&mut self) -> bool {
        self.open_ids.clear();
        self.close_ids.clear();

        loop {
            let Some(node) = self.node else {
                self.offset = self.lines.len();
                self.position = Point::INFINITY;
                return false;
            };

            if self.node_open {
                self.offset = node.end_byte();
                self.position = node.end_position().into();
                self.leave_through(node);
            } else {
                self.offset = node.start_byte();
                self.position = node.start_position().into();
                self.enter(node);
            }

            if !self.open_ids.is_empty() || !self.close_ids.is_empty() {
                return true;
            }
        }
    }

    /// Closes `node` and every ancestor ending at the same offset, then
    /// enters the next sibling if it starts right there.
    fn leave_through(&mut self, mut node: Node<'a>) {
        loop {
            self.pop_node(node);

            if let Some((sibling, distance)) = next_non_empty_sibling(node) {
                self.child_index += distance;
                if sibling.start_byte() == self.offset {
                    self.enter(sibling);
                } else {
                    self.node = Some(sibling);
                    self.node_open = false;
                }
                return;
            }

            let Some(parent) = node.parent() else {
                self.node = None;
                return;
            };
            self.node = Some(parent);
            self.child_index = self.child_indices.last().copied().unwrap_or(0);
            if parent.end_byte() > self.offset {
                // Trailing text inside the parent; close it at its own end
                return;
            }
            node = parent;
        }
    }

    /// Enters `node` and descends along its leftmost children while they
    /// start at the same offset.
    fn enter(&mut self, node: Node<'a>) {
        let mut node = node;
        loop {
            self.node = Some(node);
            self.node_open = true;
            self.push_node(node);
            if let Some(id) = self.scope_for(node) {
                self.open_ids.push(id);
            }

            let mut cursor = node.walk();
            let first = node
                .children(&mut cursor)
                .enumerate()
                .find(|(_, child)| !is_empty(*child));
            let Some((index, child)) = first else {
                return;
            };

            self.child_index = index;
            if child.start_byte() > self.offset {
                self.node = Some(child);
                self.node_open = false;
                return;
            }
            node = child;
        }
    }

    fn push_node(&mut self, node: Node<'a>) {
        self.types.push(node.kind());
        self.child_indices.push(self.child_index);
    }

    fn pop_node(&mut self, node: Node<'a>) {
        if let Some(id) = self.scope_for(node) {
            self.close_ids.push(id);
        }
        self.types.pop();
        self.child_indices.pop();
    }

    /// Scope of the node on top of the stacks.
    fn scope_for(&self, node: Node<'a>) -> Option<ScopeId> {
        self.scope_map
            .get_id(&self.types, &self.child_indices, node.is_named())
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Byte offset of the current boundary.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.node.is_none() && self.position.is_infinity()
    }

    /// Scope names opened at the current boundary, outermost first.
    pub fn open_tags(&self) -> Vec<&'a str> {
        self.names(&self.open_ids)
    }

    /// Scope names closed at the current boundary, innermost first.
    pub fn close_tags(&self) -> Vec<&'a str> {
        self.names(&self.close_ids)
    }

    pub fn open_scope_ids(&self) -> &[ScopeId] {
        &self.open_ids
    }

    pub fn close_scope_ids(&self) -> &[ScopeId] {
        &self.close_ids
    }

    /// Side table for resolving scope ids to names.
    pub fn scope_map(&self) -> &'a ScopeMap {
        self.scope_map
    }

    fn names(&self, ids: &[ScopeId]) -> Vec<&'a str> {
        let scope_map: &'a ScopeMap = self.scope_map;
        ids.iter().filter_map(|id| scope_map.scope_name(*id)).collect()
    }
}

fn is_empty(node: Node<'_>) -> bool {
    node.end_byte() <= node.start_byte()
}

/// Next sibling with a non-empty span, and how many positions away it is.
fn next_non_empty_sibling(node: Node<'_>) -> Option<(Node<'_>, usize)> {
    let mut distance = 0;
    let mut current = node;
    while let Some(sibling) = current.next_sibling() {
        distance += 1;
        if !is_empty(sibling) {
            return Some((sibling, distance));
        }
        current = sibling;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    struct Fixture {
        source: String,
        tree: Tree,
        scope_map: ScopeMap,
        lines: LineIndex,
    }

    impl Fixture {
        fn javascript(source: &str, selectors: &[(&str, &str)]) -> Self {
            let mut parser = Parser::new();
            parser
                .set_language(&tree_sitter_javascript::LANGUAGE.into())
                .expect("javascript grammar should load");
            let tree = parser.parse(source, None).expect("parse should succeed");
            Self {
                source: source.to_string(),
                tree,
                scope_map: ScopeMap::new(selectors.iter().copied()).expect("valid selectors"),
                lines: LineIndex::new(source),
            }
        }

        fn iter(&self) -> HighlightIterator<'_> {
            HighlightIterator::new(&self.tree, &self.scope_map, &self.lines)
        }
    }

    const FUNCTION_SOURCE: &str = "function foo (a) { return a + 1; }";

    const FUNCTION_SCOPES: &[(&str, &str)] = &[
        ("program", "source.js"),
        ("\"function\"", "storage.type.function"),
        ("function_declaration > identifier", "entity.name.function"),
        ("formal_parameters > identifier", "variable.parameter"),
        ("identifier", "variable"),
        ("\"(\", \")\"", "punctuation.definition.parameters"),
        ("\"{\", \"}\"", "punctuation.definition.function"),
        ("\"return\"", "keyword.control"),
        ("\"+\"", "keyword.operator"),
        ("number", "constant.numeric"),
    ];

    /// Splits the source at every boundary the iterator stops on.
    fn tokens(fixture: &Fixture) -> Vec<&str> {
        let mut iter = fixture.iter();
        let mut tokens = Vec::new();
        let mut previous = iter.offset();
        while iter.move_to_successor() {
            tokens.push(&fixture.source[previous..iter.offset()]);
            previous = iter.offset();
        }
        tokens
    }

    // ==================== stepping ====================

    #[test]
    fn test_boundaries_split_source_into_tokens() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, FUNCTION_SCOPES);
        assert_eq!(
            tokens(&fixture),
            vec![
                "function", " ", "foo", " ", "(", "a", ")", " ", "{", " ", "return", " ", "a", " ", "+", " ",
                "1", "; ", "}",
            ]
        );
        assert_eq!(tokens(&fixture).concat(), FUNCTION_SOURCE);
    }

    #[test]
    fn test_first_boundary_opens_outer_scopes() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, FUNCTION_SCOPES);
        let iter = fixture.iter();
        assert_eq!(iter.position(), Point::ZERO);
        assert_eq!(iter.open_tags(), vec!["source.js", "storage.type.function"]);
        assert!(iter.close_tags().is_empty());
    }

    #[test]
    fn test_scopes_resolve_by_ancestry() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, FUNCTION_SCOPES);
        let mut iter = fixture.iter();
        let mut opened = Vec::new();
        while iter.move_to_successor() {
            for tag in iter.open_tags() {
                opened.push((iter.offset(), tag));
            }
        }
        assert!(opened.contains(&(9, "entity.name.function")));
        assert!(opened.contains(&(14, "variable.parameter")));
        assert!(opened.contains(&(26, "variable")));
        assert!(opened.contains(&(30, "constant.numeric")));
    }

    #[test]
    fn test_close_tags_mirror_open_tags() {
        let source = "if (a) {\n  foo(b, [1, 2]);\n} else {\n  return `x${y}`;\n}\n";
        let fixture = Fixture::javascript(
            source,
            &[
                ("program", "source.js"),
                ("if_statement", "meta.if"),
                ("statement_block", "meta.block"),
                ("call_expression", "meta.call"),
                ("arguments", "meta.arguments"),
                ("array", "meta.array"),
                ("identifier", "variable"),
                ("number", "constant.numeric"),
                ("template_string", "string.template"),
                ("template_substitution", "meta.embedded"),
                ("\"(\", \")\", \"[\", \"]\"", "punctuation"),
            ],
        );

        let mut iter = fixture.iter();
        let mut stack: Vec<&str> = iter.open_tags();
        let mut previous = iter.position();
        while iter.move_to_successor() {
            assert!(iter.position() > previous, "positions must advance");
            previous = iter.position();
            assert!(!iter.open_tags().is_empty() || !iter.close_tags().is_empty());
            for tag in iter.close_tags() {
                assert_eq!(stack.pop(), Some(tag), "close out of order at {:?}", iter.position());
            }
            stack.extend(iter.open_tags());
        }
        assert!(stack.is_empty(), "unclosed scopes: {stack:?}");
    }

    #[test]
    fn test_unscoped_nodes_keep_child_indices_aligned() {
        let source = "function f(a, b) {}";
        let fixture = Fixture::javascript(
            source,
            &[("formal_parameters > identifier:nth-child(3)", "variable.parameter.second")],
        );
        let mut iter = fixture.iter();
        let mut opened = Vec::new();
        while iter.move_to_successor() {
            for tag in iter.open_tags() {
                opened.push((&source[iter.offset()..iter.offset() + 1], tag));
            }
        }
        assert_eq!(opened, vec![("b", "variable.parameter.second")]);
    }

    // ==================== exhaustion ====================

    #[test]
    fn test_exhaustion_is_idempotent() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, FUNCTION_SCOPES);
        let mut iter = fixture.iter();
        while iter.move_to_successor() {}

        assert!(iter.is_exhausted());
        for _ in 0..3 {
            assert!(!iter.move_to_successor());
            assert_eq!(iter.position(), Point::INFINITY);
            assert!(iter.open_tags().is_empty());
            assert!(iter.close_tags().is_empty());
        }
    }

    #[test]
    fn test_last_boundary_closes_root_scope() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, FUNCTION_SCOPES);
        let mut iter = fixture.iter();
        let mut last_close = Vec::new();
        while iter.move_to_successor() {
            last_close = iter.close_tags();
        }
        assert_eq!(last_close, vec!["punctuation.definition.function", "source.js"]);
    }

    const LEADING_SCOPES: &[(&str, &str)] = &[("program", "source.js"), ("identifier", "variable")];

    /// Applies every boundary to a scope stack, checking LIFO order.
    fn assert_balanced(fixture: &Fixture) -> Vec<(usize, Vec<&str>)> {
        let mut iter = fixture.iter();
        let mut stack: Vec<&str> = iter.open_tags();
        let mut seen = vec![(iter.offset(), stack.clone())];
        while iter.move_to_successor() {
            for tag in iter.close_tags() {
                assert_eq!(stack.pop(), Some(tag), "close out of order at {}", iter.offset());
            }
            stack.extend(iter.open_tags());
            seen.push((iter.offset(), stack.clone()));
        }
        assert!(stack.is_empty(), "unclosed scopes: {stack:?}");
        seen
    }

    #[test]
    fn test_leading_padding_opens_root_at_its_start() {
        let fixture = Fixture::javascript("\n\nfoo;", LEADING_SCOPES);
        let iter = fixture.iter();
        assert_eq!(iter.offset(), 0);
        assert!(iter.open_tags().is_empty());

        let seen = assert_balanced(&fixture);
        assert_eq!(seen[1], (2, vec!["source.js", "variable"]));
    }

    #[test]
    fn test_padding_on_both_sides_stays_balanced() {
        for source in ["  foo;  ", "\n  foo(1);\n\n", "foo;\n\n"] {
            let fixture = Fixture::javascript(source, LEADING_SCOPES);
            let seen = assert_balanced(&fixture);
            assert!(seen.iter().any(|(_, stack)| stack.first() == Some(&"source.js")));
        }
    }

    #[test]
    fn test_whitespace_only_document_stays_balanced() {
        for source in ["", "   ", "\n\n  \n"] {
            let fixture = Fixture::javascript(source, LEADING_SCOPES);
            assert_balanced(&fixture);
        }
    }

    #[test]
    fn test_empty_scope_map_yields_no_boundaries() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, &[]);
        let mut iter = fixture.iter();
        assert!(iter.open_tags().is_empty());
        assert!(!iter.move_to_successor());
    }

    // ==================== seeking ====================

    #[test]
    fn test_seek_reports_containing_and_open_scopes() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, FUNCTION_SCOPES);
        let mut iter = fixture.iter();

        let containing = iter.seek(Point::new(0, 14));
        assert_eq!(containing, vec!["source.js"]);
        assert_eq!(iter.open_tags(), vec!["variable.parameter"]);

        assert!(iter.move_to_successor());
        assert_eq!(iter.offset(), 15);
        assert_eq!(iter.close_tags(), vec!["variable.parameter"]);
        assert_eq!(iter.open_tags(), vec!["punctuation.definition.parameters"]);
    }

    #[test]
    fn test_seek_inside_token_reports_it_as_containing() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, FUNCTION_SCOPES);
        let mut iter = fixture.iter();

        let containing = iter.seek(Point::new(0, 21));
        assert_eq!(containing, vec!["source.js", "keyword.control"]);
        assert!(iter.open_tags().is_empty());

        assert!(iter.move_to_successor());
        assert_eq!(iter.offset(), 25);
        assert_eq!(iter.close_tags(), vec!["keyword.control"]);
    }

    #[test]
    fn test_seek_into_gap_opens_next_node_on_step() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, FUNCTION_SCOPES);
        let mut iter = fixture.iter();

        let containing = iter.seek(Point::new(0, 16));
        assert_eq!(containing, vec!["source.js"]);
        assert!(iter.open_tags().is_empty());

        assert!(iter.move_to_successor());
        assert_eq!(iter.offset(), 17);
        assert_eq!(iter.open_tags(), vec!["punctuation.definition.function"]);
    }

    #[test]
    fn test_seek_then_walk_matches_full_walk() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, FUNCTION_SCOPES);

        let mut full = fixture.iter();
        let mut from_start = Vec::new();
        while full.move_to_successor() {
            if full.offset() > 19 {
                from_start.push((full.offset(), full.close_tags(), full.open_tags()));
            }
        }

        let mut seeked = fixture.iter();
        seeked.seek(Point::new(0, 19));
        let mut from_seek = Vec::new();
        while seeked.move_to_successor() {
            from_seek.push((seeked.offset(), seeked.close_tags(), seeked.open_tags()));
        }

        assert_eq!(from_seek, from_start);
    }

    #[test]
    fn test_seek_past_end_clips_to_document() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, FUNCTION_SCOPES);
        let mut iter = fixture.iter();

        let containing = iter.seek(Point::new(5, 0));
        assert_eq!(iter.offset(), FUNCTION_SOURCE.len());
        assert!(containing.is_empty());
        assert!(iter.open_tags().is_empty());
        assert!(!iter.move_to_successor());
        assert!(iter.is_exhausted());
    }

    #[test]
    fn test_seek_into_leading_padding() {
        let fixture = Fixture::javascript("\n\nfoo;", LEADING_SCOPES);
        let mut iter = fixture.iter();

        assert!(iter.seek(Point::new(1, 0)).is_empty());
        assert!(iter.open_tags().is_empty());
        assert!(iter.move_to_successor());
        assert_eq!(iter.offset(), 2);
        assert_eq!(iter.open_tags(), vec!["source.js", "variable"]);
    }

    #[test]
    fn test_scope_ids_resolve_through_side_table() {
        let fixture = Fixture::javascript(FUNCTION_SOURCE, FUNCTION_SCOPES);
        let iter = fixture.iter();
        let names: Vec<_> = iter
            .open_scope_ids()
            .iter()
            .filter_map(|id| iter.scope_map().scope_name(*id))
            .collect();
        assert_eq!(names, iter.open_tags());
    }
}
