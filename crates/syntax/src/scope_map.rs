// Chunk: docs/chunks/scope_highlighting - Child-selector scope map

//! Selector-driven scope resolution.
//!
//! A [`ScopeMap`] is compiled from a table of CSS-like selectors such as
//! `"formal_parameters > identifier"` or `"\"(\""`, each mapped to a scope name
//! like `variable.parameter.function.js`. At highlight time the iterator asks
//! it to resolve a node given the types of its ancestors and each ancestor's
//! index among its parent's children.
//!
//! ## Selector syntax
//!
//! - a bare identifier matches a named node type
//! - a single- or double-quoted literal matches an anonymous token
//! - `*` matches any named node type
//! - any term may be suffixed with `:nth-child(N)`, where `N` is the 0-based
//!   index of the node among all of its parent's children
//! - terms are joined with the child combinator `>`
//! - several selectors may share one scope name when separated by `,`
//!
//! Any other combinator or pseudo-selector is rejected when the map is built.
//!
//! ## Index structure
//!
//! Selectors are stored right-to-left in two tries, one for named leaves and
//! one for anonymous leaves. Each trie node may carry a scope, a table of
//! nth-child qualified variants of itself, and a table of parent types that
//! continue the selector upward. Resolution walks from the leaf toward the
//! root and keeps the deepest scope it passes.

use crate::error::ConfigError;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::CharIndices;

/// Compact identifier for an interned scope name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Compiled selector table.
#[derive(Debug, Clone, Default)]
pub struct ScopeMap {
    named: TypeTable,
    anonymous: TypeTable,
    scope_names: Vec<String>,
    ids_by_name: HashMap<String, ScopeId>,
}

#[derive(Debug, Clone, Default)]
struct TypeTable {
    by_type: HashMap<String, TableNode>,
    wildcard: Option<Box<TableNode>>,
}

#[derive(Debug, Clone, Default)]
struct TableNode {
    scope: Option<ScopeId>,
    indices: HashMap<usize, TableNode>,
    parents: TypeTable,
}

impl TypeTable {
    fn entry(&mut self, term: &Term) -> &mut TableNode {
        match term {
            Term::Tag(name) | Term::Literal(name) => self.by_type.entry(name.clone()).or_default(),
            Term::Wildcard => &mut **self.wildcard.get_or_insert_with(Box::default),
        }
    }

    /// Looks up `node_type`, falling back to the wildcard entry.
    fn lookup(&self, node_type: &str) -> Option<&TableNode> {
        self.by_type.get(node_type).or(self.wildcard.as_deref())
    }

    fn nodes_mut(&mut self) -> impl Iterator<Item = &mut TableNode> {
        self.by_type
            .values_mut()
            .chain(self.wildcard.as_deref_mut())
    }

    /// Copies every entry of `defaults` whose key is missing here.
    fn inherit(&mut self, defaults: &TypeTable) {
        for (node_type, node) in &defaults.by_type {
            self.by_type
                .entry(node_type.clone())
                .or_insert_with(|| node.clone());
        }
        if self.wildcard.is_none() {
            self.wildcard = defaults.wildcard.clone();
        }
    }
}

impl TableNode {
    /// Makes every nth-child variant of this node fall back to the
    /// unqualified node's scope and parent links where it has none of its own.
    fn apply_index_defaults(&mut self) {
        for parent in self.parents.nodes_mut() {
            parent.apply_index_defaults();
        }
        for indexed in self.indices.values_mut() {
            indexed.apply_index_defaults();
        }
        if self.indices.is_empty() {
            return;
        }

        let parents = self.parents.clone();
        for indexed in self.indices.values_mut() {
            if indexed.scope.is_none() {
                indexed.scope = self.scope;
            }
            indexed.parents.inherit(&parents);
        }
    }
}

impl ScopeMap {
    /// Compiles a selector table.
    ///
    /// Fails on the first selector with an unsupported shape; a partially
    /// built map is never returned.
    pub fn new<I, K, V>(selectors: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = ScopeMap::default();
        let mut selector_count = 0;
        for (selector, scope_name) in selectors {
            map.add_selector(selector.as_ref(), scope_name.as_ref())?;
            selector_count += 1;
        }

        for node in map.named.nodes_mut().chain(map.anonymous.nodes_mut()) {
            node.apply_index_defaults();
        }

        tracing::debug!(
            selectors = selector_count,
            scopes = map.scope_names.len(),
            "compiled scope map"
        );
        Ok(map)
    }

    fn add_selector(&mut self, selector: &str, scope_name: &str) -> Result<(), ConfigError> {
        let chains = SelectorParser::new(selector).parse()?;
        let scope = self.intern(scope_name);

        for chain in chains {
            let Some((leaf, ancestors)) = chain.split_last() else {
                continue;
            };

            let table = match leaf.term {
                Term::Literal(_) => &mut self.anonymous,
                Term::Tag(_) | Term::Wildcard => &mut self.named,
            };
            let mut node = table.entry(&leaf.term);
            if let Some(index) = leaf.nth_child {
                node = node.indices.entry(index).or_default();
            }

            for compound in ancestors.iter().rev() {
                node = node.parents.entry(&compound.term);
                if let Some(index) = compound.nth_child {
                    node = node.indices.entry(index).or_default();
                }
            }

            node.scope = Some(scope);
        }

        Ok(())
    }

    fn intern(&mut self, scope_name: &str) -> ScopeId {
        if let Some(id) = self.ids_by_name.get(scope_name) {
            return *id;
        }
        let id = ScopeId(self.scope_names.len() as u32);
        self.scope_names.push(scope_name.to_string());
        self.ids_by_name.insert(scope_name.to_string(), id);
        id
    }

    /// Resolves a node to its scope name.
    ///
    /// `node_types` runs from the root to the node being resolved, and
    /// `child_indices[i]` is the index of `node_types[i]` among its parent's
    /// children. `leaf_is_named` selects the named or anonymous trie.
    pub fn get(&self, node_types: &[&str], child_indices: &[usize], leaf_is_named: bool) -> Option<&str> {
        self.get_id(node_types, child_indices, leaf_is_named)
            .and_then(|id| self.scope_name(id))
    }

    /// Like [`ScopeMap::get`], returning the interned id.
    pub fn get_id(&self, node_types: &[&str], child_indices: &[usize], leaf_is_named: bool) -> Option<ScopeId> {
        let leaf = *node_types.last()?;
        let table = if leaf_is_named { &self.named } else { &self.anonymous };

        table
            .by_type
            .get(leaf)
            .and_then(|node| resolve_from(node, node_types, child_indices))
            .or_else(|| {
                table
                    .wildcard
                    .as_deref()
                    .and_then(|node| resolve_from(node, node_types, child_indices))
            })
    }

    pub fn scope_name(&self, id: ScopeId) -> Option<&str> {
        self.scope_names.get(id.index()).map(String::as_str)
    }

    pub fn scope_id(&self, scope_name: &str) -> Option<ScopeId> {
        self.ids_by_name.get(scope_name).copied()
    }

    /// Number of distinct scope names.
    pub fn scope_count(&self) -> usize {
        self.scope_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scope_names.is_empty()
    }
}

/// Walks from the leaf entry toward the root, returning the deepest scope seen.
fn resolve_from(mut node: &TableNode, node_types: &[&str], child_indices: &[usize]) -> Option<ScopeId> {
    let mut result = None;
    let mut i = node_types.len() - 1;

    loop {
        if let Some(indexed) = child_indices.get(i).and_then(|index| node.indices.get(index)) {
            node = indexed;
        }
        if node.scope.is_some() {
            result = node.scope;
        }
        if i == 0 {
            break;
        }
        i -= 1;
        match node.parents.lookup(node_types[i]) {
            Some(parent) => node = parent,
            None => break,
        }
    }

    result
}

// ==================== selector parsing ====================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Term {
    Tag(String),
    Literal(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    term: Term,
    nth_child: Option<usize>,
}

/// Parses a selector list into chains of compounds, root-most first.
struct SelectorParser<'a> {
    selector: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> SelectorParser<'a> {
    fn new(selector: &'a str) -> Self {
        Self {
            selector,
            chars: selector.char_indices().peekable(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::selector(self.selector, reason)
    }

    fn parse(mut self) -> Result<Vec<Vec<Compound>>, ConfigError> {
        let mut chains = Vec::new();
        let mut chain = Vec::new();

        loop {
            self.skip_whitespace();
            chain.push(self.parse_compound()?);
            let skipped = self.skip_whitespace();

            match self.chars.next() {
                None => {
                    chains.push(chain);
                    return Ok(chains);
                }
                Some((_, ',')) => chains.push(std::mem::take(&mut chain)),
                Some((_, '>')) => {}
                Some((_, '+' | '~')) => {
                    return Err(self.error("only the child combinator '>' is supported"))
                }
                Some(_) if skipped => {
                    return Err(self.error("descendant combinators are not supported"))
                }
                Some((_, c)) => return Err(self.error(format!("unexpected character '{c}'"))),
            }
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {
            skipped = true;
        }
        skipped
    }

    fn parse_compound(&mut self) -> Result<Compound, ConfigError> {
        let term = match self.chars.peek().copied() {
            None | Some((_, ',' | '>')) => return Err(self.error("empty selector term")),
            Some((_, quote @ ('"' | '\''))) => {
                self.chars.next();
                Term::Literal(self.parse_quoted(quote)?)
            }
            Some((_, '*')) => {
                self.chars.next();
                Term::Wildcard
            }
            Some((_, c)) if is_ident_char(c) => Term::Tag(self.parse_ident()),
            Some((_, '[')) => return Err(self.error("attribute selectors are not supported")),
            Some((_, '.' | '#')) => return Err(self.error("class and id selectors are not supported")),
            Some((_, '+' | '~')) => return Err(self.error("only the child combinator '>' is supported")),
            Some((_, c)) => return Err(self.error(format!("unexpected character '{c}'"))),
        };

        let nth_child = if self.chars.next_if(|(_, c)| *c == ':').is_some() {
            Some(self.parse_pseudo()?)
        } else {
            None
        };

        match self.chars.peek() {
            Some((_, ':')) => Err(self.error("only one pseudo-selector per term is supported")),
            Some((_, '[')) => Err(self.error("attribute selectors are not supported")),
            Some((_, '.' | '#')) => Err(self.error("class and id selectors are not supported")),
            _ => Ok(Compound { term, nth_child }),
        }
    }

    fn parse_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some((_, c)) = self.chars.next_if(|(_, c)| is_ident_char(*c)) {
            ident.push(c);
        }
        ident
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String, ConfigError> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.error("unterminated string literal")),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, c)) => value.push(c),
                    None => return Err(self.error("unterminated string literal")),
                },
                Some((_, c)) if c == quote => return Ok(value),
                Some((_, c)) => value.push(c),
            }
        }
    }

    fn parse_pseudo(&mut self) -> Result<usize, ConfigError> {
        let name = self.parse_ident();
        if name != "nth-child" {
            return Err(self.error(format!("unsupported pseudo-selector ':{name}'")));
        }
        if self.chars.next_if(|(_, c)| *c == '(').is_none() {
            return Err(self.error("expected '(' after ':nth-child'"));
        }
        self.skip_whitespace();

        let mut digits = String::new();
        while let Some((_, c)) = self.chars.next_if(|(_, c)| c.is_ascii_digit()) {
            digits.push(c);
        }
        self.skip_whitespace();
        if self.chars.next_if(|(_, c)| *c == ')').is_none() {
            return Err(self.error("':nth-child' takes a single integer index"));
        }

        digits
            .parse()
            .map_err(|_| self.error("':nth-child' takes a single integer index"))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}
