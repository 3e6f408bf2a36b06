// Chunk: docs/chunks/scope_highlighting - Selector-driven scope highlighting over tree-sitter trees

//! treescope-syntax: scope highlighting, folding and structural selection over
//! incrementally parsed tree-sitter trees.
//!
//! # Overview
//!
//! The main types are:
//!
//! - [`ScopeMap`]: compiles CSS-like child selectors (`"formal_parameters >
//!   identifier"`, `"\"(\""`, `"*:nth-child(0)"`) into a lookup that resolves a
//!   node, given its ancestor types and child indices, to a scope name.
//!
//! - [`HighlightIterator`]: walks a tree in document order and reports, at
//!   each boundary, which scopes closed and which opened. Supports seeking to
//!   an arbitrary point.
//!
//! - [`FoldConfig`] / [`FoldResolver`]: derive fold ranges from declarative
//!   delimiter and token rules, per row or per nesting level.
//!
//! - [`LanguageMode`]: owns the parser and tree for one document, applies
//!   edits with incremental re-parsing and answers highlight and fold queries.
//!
//! - [`LanguageRegistry`]: maps ids, extensions and language names to
//!   compiled [`Grammar`]s, shared across documents.
//!
//! - [`StructuralSelector`]: grows, shrinks and moves selections along the
//!   tree.
//!
//! # Example
//!
//! ```ignore
//! use treescope_syntax::{LanguageDefinition, LanguageMode, LanguageRegistry};
//!
//! let mut registry = LanguageRegistry::new();
//! registry.register(LanguageDefinition::from_json(JAVASCRIPT_JSON)?);
//!
//! let grammar = registry.grammar_for_extension("js")?;
//! let mode = LanguageMode::new(grammar, "function foo (a) { return a + 1; }")?;
//!
//! let mut iter = mode.build_iterator();
//! while iter.move_to_successor() {
//!     println!("{:?} -{:?} +{:?}", iter.position(), iter.close_tags(), iter.open_tags());
//! }
//! ```

mod edit;
mod error;
mod fold;
mod highlight_iterator;
mod language_mode;
mod line_index;
mod point;
mod registry;
mod scope_map;
mod selection;

pub use edit::TreeEdit;
pub use error::{ConfigError, LoadError};
pub use fold::{DelimiterRule, FoldConfig, FoldOptions, FoldResolver, TokenRule};
pub use highlight_iterator::HighlightIterator;
pub use language_mode::LanguageMode;
pub use line_index::LineIndex;
pub use point::{Point, Range};
pub use registry::{builtin_language, CommentStrings, Grammar, LanguageDefinition, LanguageRegistry};
pub use scope_map::{ScopeId, ScopeMap};
pub use selection::StructuralSelector;
