// Chunk: docs/chunks/language_definitions - JSON language definitions (scopes + fold rules)

//! Integration tests for loading language definitions from disk.

use std::fs;
use std::sync::Arc;
use treescope_syntax::{ConfigError, LanguageMode, LanguageRegistry, LoadError, Point, Range};

const PYTHON: &str = r##"{
    "id": "python",
    "grammar": "python",
    "extensions": ["py", "pyw"],
    "scopes": {
        "module": "source.python",
        "\"def\"": "storage.type.function.python",
        "function_definition > identifier": "entity.name.function.python",
        "comment": "comment.line.number-sign.python"
    },
    "folds": {
        "delimiters": [["(", ")"], ["[", "]"]]
    },
    "commentStrings": { "commentStartString": "# " }
}"##;

#[test]
fn test_load_definition_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("python.json");
    fs::write(&path, PYTHON).unwrap();

    let mut registry = LanguageRegistry::new();
    let grammar = registry.load_definition(&path).unwrap();
    assert_eq!(grammar.id(), "python");
    assert!(Arc::ptr_eq(&grammar, &registry.grammar_for_extension("pyw").unwrap()));
    assert!(Arc::ptr_eq(&grammar, &registry.grammar_for_language_name("Python").unwrap()));

    let mode = LanguageMode::new(grammar, "def greet(name):\n    # hi\n    return name\n").unwrap();
    assert_eq!(mode.comment_strings().comment_start_string.as_deref(), Some("# "));

    let mut iter = mode.build_iterator();
    assert_eq!(iter.open_tags(), vec!["source.python", "storage.type.function.python"]);
    assert!(iter.move_to_successor());
    assert_eq!(iter.close_tags(), vec!["storage.type.function.python"]);
    assert!(iter.move_to_successor());
    assert_eq!(iter.open_tags(), vec!["entity.name.function.python"]);
    assert_eq!(iter.position(), Point::new(0, 4));
}

#[test]
fn test_definition_without_fold_braces_only_folds_parens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("python.json");
    fs::write(&path, PYTHON).unwrap();

    let mut registry = LanguageRegistry::new();
    let grammar = registry.load_definition(&path).unwrap();
    let mode = LanguageMode::new(grammar, "total = sum([\n    1,\n    2,\n])\n").unwrap();

    assert!(mode.is_foldable_at_row(0));
    assert_eq!(
        mode.fold_range_at_row(0),
        Some(Range::new(Point::new(0, 13), Point::new(3, 0)))
    );
}

#[test]
fn test_invalid_selector_disables_language() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{"id": "bad", "grammar": "json", "extensions": ["bad"], "scopes": {"object pair": "x"}}"#,
    )
    .unwrap();

    let mut registry = LanguageRegistry::new();
    let err = registry.load_definition(&path).unwrap_err();
    match err {
        LoadError::Config(ConfigError::UnsupportedSelector { selector, .. }) => {
            assert_eq!(selector, "object pair");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(registry.grammar_for_extension("bad").is_err());
    // Other languages are unaffected
    assert!(registry.grammar_for_extension("json").is_ok());
}

#[test]
fn test_malformed_json_names_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"id\": ").unwrap();

    let mut registry = LanguageRegistry::new();
    let err = registry.load_definition(&path).unwrap_err();
    assert!(matches!(err, LoadError::Json { path: Some(_), .. }));
    assert!(err.to_string().contains("broken.json"), "got: {err}");
}
