// Chunk: docs/chunks/language_definitions - Configuration and loading errors

//! Error types.
//!
//! Selector tables and fold rules are validated once, when a grammar is
//! compiled. Everything that can go wrong there is a [`ConfigError`]; lookups
//! against a compiled table never fail.

use std::path::PathBuf;
use thiserror::Error;

/// A malformed selector table, fold rule or grammar binding.
///
/// Cloneable so the registry can hand the same cached failure to every
/// document of a language.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A selector uses a shape the scope map does not support.
    #[error("unsupported selector '{selector}': {reason}")]
    UnsupportedSelector { selector: String, reason: String },

    /// A fold rule is malformed.
    #[error("invalid fold rule {rule}: {reason}")]
    InvalidFoldRule { rule: String, reason: String },

    /// No grammar is registered under the requested name.
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),

    /// The parser rejected the grammar (ABI version mismatch).
    #[error("incompatible grammar for '{language}': {message}")]
    IncompatibleGrammar { language: String, message: String },
}

impl ConfigError {
    pub(crate) fn selector(selector: &str, reason: impl Into<String>) -> Self {
        ConfigError::UnsupportedSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn fold_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidFoldRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}

/// Failure to read or decode a language definition document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read language definition {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed language definition{}: {source}", display_path(path))]
    Json {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" {}", path.display()),
        None => String::new(),
    }
}
