// Chunk: docs/chunks/language_definitions - Language registry and compiled grammars

//! Language registry mapping grammar ids, file extensions and language names
//! to compiled grammars.
//!
//! A [`LanguageDefinition`] is data: which tree-sitter grammar to parse with,
//! a selector table for scopes and a fold rule table. The registry compiles a
//! definition into a [`Grammar`] the first time a document asks for it and
//! hands the same `Arc<Grammar>` to every later document of that language.
//! Compilation failures are cached too, so a broken definition disables the
//! language instead of being retried per document.

use crate::error::{ConfigError, LoadError};
use crate::fold::FoldConfig;
use crate::scope_map::ScopeMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tree_sitter::{Language, Parser};

/// Comment delimiters used by toggle-comment commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentStrings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_start_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_end_string: Option<String>,
}

/// Declarative description of one language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDefinition {
    /// Registry key, e.g. `"javascript"`.
    pub id: String,
    /// Name of the built-in tree-sitter grammar to parse with.
    pub grammar: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Selector to scope name.
    #[serde(default)]
    pub scopes: BTreeMap<String, String>,
    #[serde(default)]
    pub folds: FoldConfig,
    #[serde(default)]
    pub comment_strings: CommentStrings,
}

impl LanguageDefinition {
    /// A definition with no scopes and no fold rules.
    pub fn bare(id: impl Into<String>, grammar: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            id: id.into(),
            grammar: grammar.into(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
            scopes: BTreeMap::new(),
            folds: FoldConfig::default(),
            comment_strings: CommentStrings::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        serde_json::from_str(json).map_err(|source| LoadError::Json { path: None, source })
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| LoadError::Json {
            path: Some(path.to_path_buf()),
            source,
        })
    }
}

/// A compiled language: parser grammar plus validated scope and fold tables.
///
/// Read-only after compilation and shared across documents.
pub struct Grammar {
    id: String,
    language: Language,
    scope_map: ScopeMap,
    folds: FoldConfig,
    comment_strings: CommentStrings,
}

impl Grammar {
    /// Validates a definition against a tree-sitter language.
    pub fn compile(definition: &LanguageDefinition, language: Language) -> Result<Self, ConfigError> {
        Parser::new()
            .set_language(&language)
            .map_err(|err| ConfigError::IncompatibleGrammar {
                language: definition.id.clone(),
                message: err.to_string(),
            })?;

        let scope_map = ScopeMap::new(&definition.scopes)?;
        definition.folds.validate()?;

        Ok(Self {
            id: definition.id.clone(),
            language,
            scope_map,
            folds: definition.folds.clone(),
            comment_strings: definition.comment_strings.clone(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn scope_map(&self) -> &ScopeMap {
        &self.scope_map
    }

    pub fn folds(&self) -> &FoldConfig {
        &self.folds
    }

    pub fn comment_strings(&self) -> &CommentStrings {
        &self.comment_strings
    }
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("id", &self.id)
            .field("scopes", &self.scope_map.scope_count())
            .finish_non_exhaustive()
    }
}

/// Returns the tree-sitter language for a built-in grammar name.
pub fn builtin_language(grammar: &str) -> Option<Language> {
    let language = match grammar {
        "rust" => tree_sitter_rust::LANGUAGE.into(),
        "c" => tree_sitter_c::LANGUAGE.into(),
        "cpp" => tree_sitter_cpp::LANGUAGE.into(),
        "python" => tree_sitter_python::LANGUAGE.into(),
        "javascript" => tree_sitter_javascript::LANGUAGE.into(),
        "typescript" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        "tsx" => tree_sitter_typescript::LANGUAGE_TSX.into(),
        "go" => tree_sitter_go::LANGUAGE.into(),
        "json" => tree_sitter_json::LANGUAGE.into(),
        "toml" => tree_sitter_toml_ng::LANGUAGE.into(),
        "markdown" => tree_sitter_md::LANGUAGE.into(),
        "yaml" => tree_sitter_yaml::LANGUAGE.into(),
        "html" => tree_sitter_html::LANGUAGE.into(),
        "css" => tree_sitter_css::LANGUAGE.into(),
        "bash" => tree_sitter_bash::LANGUAGE.into(),
        _ => return None,
    };
    Some(language)
}

/// Built-in grammars and the extensions they claim by default.
const BUILTIN_GRAMMARS: &[(&str, &[&str])] = &[
    ("rust", &["rs"]),
    ("cpp", &["cpp", "cc", "cxx", "hpp", "h"]), // .h is ambiguous, default to C++
    ("c", &["c"]),
    ("python", &["py"]),
    ("typescript", &["ts"]),
    ("tsx", &["tsx"]),
    ("javascript", &["js", "jsx", "mjs"]),
    ("go", &["go"]),
    ("json", &["json"]),
    ("toml", &["toml"]),
    ("markdown", &["md", "markdown"]),
    ("yaml", &["yaml", "yml"]),
    ("html", &["html", "htm"]),
    ("css", &["css"]),
    ("bash", &["sh", "bash", "zsh"]),
];

struct Entry {
    definition: LanguageDefinition,
    compiled: OnceLock<Result<Arc<Grammar>, ConfigError>>,
}

impl Entry {
    fn new(definition: LanguageDefinition) -> Self {
        Self {
            definition,
            compiled: OnceLock::new(),
        }
    }

    fn grammar(&self) -> Result<Arc<Grammar>, ConfigError> {
        self.compiled
            .get_or_init(|| {
                let definition = &self.definition;
                let result = builtin_language(&definition.grammar)
                    .ok_or_else(|| ConfigError::UnknownLanguage(definition.grammar.clone()))
                    .and_then(|language| Grammar::compile(definition, language))
                    .map(Arc::new);
                match &result {
                    Ok(grammar) => tracing::debug!(
                        language = %definition.id,
                        scopes = grammar.scope_map().scope_count(),
                        "compiled grammar"
                    ),
                    Err(err) => tracing::warn!(
                        language = %definition.id,
                        error = %err,
                        "language definition failed to compile; highlighting and folding disabled"
                    ),
                }
                result
            })
            .clone()
    }
}

/// Registry of language definitions keyed by id.
///
/// Owned by the host for the life of the process. Compiled grammars are
/// cached per entry and never invalidated; registering a definition under an
/// existing id replaces the entry (and its cache).
pub struct LanguageRegistry {
    entries: HashMap<String, Entry>,
    /// Map from extension (without leading dot) to language id
    extensions: HashMap<String, String>,
}

impl LanguageRegistry {
    /// Creates an empty language registry.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            extensions: HashMap::new(),
        }
    }

    /// Creates a registry with every built-in grammar registered under its
    /// own name, with empty scope and fold tables.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (grammar, extensions) in BUILTIN_GRAMMARS {
            registry.register(LanguageDefinition::bare(*grammar, *grammar, extensions));
        }
        registry
    }

    /// Installs a definition, replacing any earlier one with the same id.
    pub fn register(&mut self, definition: LanguageDefinition) {
        let id = definition.id.clone();
        self.extensions.retain(|_, owner| *owner != id);
        for ext in &definition.extensions {
            let ext = ext.strip_prefix('.').unwrap_or(ext);
            self.extensions.insert(ext.to_string(), id.clone());
        }
        tracing::debug!(language = %id, extensions = definition.extensions.len(), "registered language");
        self.entries.insert(id, Entry::new(definition));
    }

    /// Loads a definition file, registers it and compiles it.
    ///
    /// A definition that parses but fails to compile stays registered; later
    /// lookups return the same [`ConfigError`].
    pub fn load_definition(&mut self, path: &Path) -> Result<Arc<Grammar>, LoadError> {
        let definition = LanguageDefinition::load(path)?;
        let id = definition.id.clone();
        self.register(definition);
        Ok(self.grammar(&id)?)
    }

    /// Returns the compiled grammar registered under `id`.
    pub fn grammar(&self, id: &str) -> Result<Arc<Grammar>, ConfigError> {
        self.entries
            .get(id)
            .ok_or_else(|| ConfigError::UnknownLanguage(id.to_string()))?
            .grammar()
    }

    /// Returns the grammar for a file extension.
    ///
    /// The extension can be with or without a leading dot (e.g., ".rs" or "rs").
    pub fn grammar_for_extension(&self, ext: &str) -> Result<Arc<Grammar>, ConfigError> {
        match self.language_id_for_extension(ext) {
            Some(id) => self.grammar(id),
            None => Err(ConfigError::UnknownLanguage(ext.strip_prefix('.').unwrap_or(ext).to_string())),
        }
    }

    /// Id of the language claiming an extension, without compiling it.
    pub fn language_id_for_extension(&self, ext: &str) -> Option<&str> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        self.extensions.get(ext).map(String::as_str)
    }

    /// Returns the grammar for a language name, as written in fenced code
    /// blocks ("rust", "golang", "c++", ...).
    ///
    /// Names are matched case-insensitively after trimming. Unknown names
    /// fall back to registered ids, then to extensions.
    pub fn grammar_for_language_name(&self, name: &str) -> Result<Arc<Grammar>, ConfigError> {
        // Normalize: lowercase and trim
        let name = name.trim().to_lowercase();

        let id = match name.as_str() {
            "rs" => "rust",
            "py" => "python",
            "js" => "javascript",
            "ts" => "typescript",
            "shell" | "sh" | "zsh" => "bash",
            "c++" => "cpp",
            "golang" => "go",
            "md" => "markdown",
            "yml" => "yaml",
            other => other,
        };

        if self.entries.contains_key(id) {
            self.grammar(id)
        } else {
            self.grammar_for_extension(id)
        }
    }

    /// Returns an iterator over all registered extensions.
    pub fn supported_extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }

    /// Registered language ids, sorted.
    pub fn language_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn definition(&self, id: &str) -> Option<&LanguageDefinition> {
        self.entries.get(id).map(|entry| &entry.definition)
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
