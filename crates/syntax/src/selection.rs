// Chunk: docs/chunks/structural_selection - Syntax-aware selection expansion

//! Selection commands that move along the syntax tree.
//!
//! Each selection grows to its enclosing node (`select_up`), shrinks back
//! (`select_down`), or jumps to the neighboring node at the same depth
//! (`select_left` / `select_right`). Selections are byte ranges; nodes are
//! looked up fresh from the tree on every command, so nothing here refers to
//! a node across an edit.

use std::ops::Range;
use tree_sitter::{Node, Tree};

/// Expansion history for a set of selections.
///
/// One stack per selection remembers the ranges `select_up` grew from, so
/// `select_down` can retrace them. A stack is dropped when its selection no
/// longer matches a node exactly, and all stacks are reset when the number of
/// selections changes.
#[derive(Debug, Default)]
pub struct StructuralSelector {
    stacks: Vec<Vec<Range<usize>>>,
}

impl StructuralSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grows each selection to the smallest enclosing node with a larger span.
    pub fn select_up(&mut self, tree: &Tree, selections: &[Range<usize>]) -> Vec<Range<usize>> {
        self.update(tree, selections, |node, stack, current| {
            let mut candidate = Some(node);
            while let Some(n) = candidate {
                if n.byte_range() != current {
                    break;
                }
                candidate = n.parent();
            }

            let target = candidate?;
            stack.push(node.byte_range());
            Some(target.byte_range())
        })
    }

    /// Undoes the last `select_up`, or shrinks to the first child.
    pub fn select_down(&mut self, tree: &Tree, selections: &[Range<usize>]) -> Vec<Range<usize>> {
        self.update(tree, selections, |node, stack, _| match stack.pop() {
            Some(range) => Some(range),
            None => node.child(0).map(|child| child.byte_range()),
        })
    }

    /// Moves each selection to the previous node at the same depth.
    pub fn select_left(&mut self, tree: &Tree, selections: &[Range<usize>]) -> Vec<Range<usize>> {
        self.update(tree, selections, |node, stack, _| {
            stack.clear();
            let (sibling, depth) = climb_until(node, |n| n.prev_sibling())?;
            Some(descend(sibling, depth, |n| n.child(n.child_count().checked_sub(1)?)).byte_range())
        })
    }

    /// Moves each selection to the next node at the same depth.
    pub fn select_right(&mut self, tree: &Tree, selections: &[Range<usize>]) -> Vec<Range<usize>> {
        self.update(tree, selections, |node, stack, _| {
            stack.clear();
            let (sibling, depth) = climb_until(node, |n| n.next_sibling())?;
            Some(descend(sibling, depth, |n| n.child(0)).byte_range())
        })
    }

    fn update<F>(&mut self, tree: &Tree, selections: &[Range<usize>], mut step: F) -> Vec<Range<usize>>
    where
        F: FnMut(Node<'_>, &mut Vec<Range<usize>>, Range<usize>) -> Option<Range<usize>>,
    {
        if self.stacks.len() != selections.len() {
            self.stacks = vec![Vec::new(); selections.len()];
        }

        let root = tree.root_node();
        selections
            .iter()
            .zip(self.stacks.iter_mut())
            .map(|(selection, stack)| {
                let start = selection.start;
                let end = selection.end.max(start);
                let last = end.saturating_sub(1).max(start);
                let Some(node) = root.descendant_for_byte_range(start, last) else {
                    return selection.clone();
                };

                if node.start_byte() < start || node.end_byte() > end {
                    stack.clear();
                }

                if end > start {
                    step(node, stack, start..end).unwrap_or_else(|| selection.clone())
                } else {
                    node.byte_range()
                }
            })
            .collect()
    }
}

/// Walks up from `node` until `neighbor` yields a node, returning it and how
/// many levels were climbed.
fn climb_until<'tree>(
    node: Node<'tree>,
    neighbor: impl Fn(Node<'tree>) -> Option<Node<'tree>>,
) -> Option<(Node<'tree>, usize)> {
    let mut node = node;
    let mut depth = 0;
    loop {
        if let Some(found) = neighbor(node) {
            return Some((found, depth));
        }
        node = node.parent()?;
        depth += 1;
    }
}

/// Descends up to `depth` levels through `child`, stopping at leaves.
fn descend<'tree>(
    node: Node<'tree>,
    depth: usize,
    child: impl Fn(Node<'tree>) -> Option<Node<'tree>>,
) -> Node<'tree> {
    let mut node = node;
    for _ in 0..depth {
        match child(node) {
            Some(next) => node = next,
            None => break,
        }
    }
    node
}
