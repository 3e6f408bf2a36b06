// Chunk: docs/chunks/tree_folding - Declarative fold rules over tree-sitter nodes

//! Integration tests for fold queries on a document session.
//!
//! Folding a range is simulated by replacing it with an ellipsis, the way the
//! display layer renders a collapsed fold.

use treescope_syntax::{LanguageDefinition, LanguageMode, LanguageRegistry, Point, Range};

const JAVASCRIPT: &str = r#"{
    "id": "javascript",
    "grammar": "javascript",
    "extensions": ["js"],
    "folds": {
        "delimiters": [
            ["{", "}"],
            ["(", ")"],
            ["[", "]"]
        ],
        "tokens": [["comment", 2, 2]]
    }
}"#;

fn javascript_mode(source: &str) -> LanguageMode {
    let mut registry = LanguageRegistry::empty();
    registry.register(LanguageDefinition::from_json(JAVASCRIPT).unwrap());
    LanguageMode::new(registry.grammar("javascript").unwrap(), source).unwrap()
}

fn folded(mode: &LanguageMode, range: Range) -> String {
    let lines = mode.line_index();
    let start = lines.offset_for_point(range.start);
    let end = lines.offset_for_point(range.end);
    format!("{}\u{2026}{}", &mode.source()[..start], &mode.source()[end..])
}

fn foldable_rows(mode: &LanguageMode) -> Vec<usize> {
    (0..mode.line_count()).filter(|row| mode.is_foldable_at_row(*row)).collect()
}

const CLASS: &str = "module.exports =\nclass A {\n  getB() {\n    return this.b;\n  }\n};\n";

#[test]
fn test_class_rows() {
    let mode = javascript_mode(CLASS);
    assert_eq!(foldable_rows(&mode), vec![1, 2]);
}

#[test]
fn test_fold_method_body() {
    let mode = javascript_mode(CLASS);
    let range = mode.fold_range_at_row(2).unwrap();
    let text = folded(&mode, range);
    assert_eq!(
        text,
        "module.exports =\nclass A {\n  getB() {\u{2026}}\n};\n"
    );
}

#[test]
fn test_fold_class_body() {
    let mode = javascript_mode(CLASS);
    let range = mode.fold_range_at_row(1).unwrap();
    assert_eq!(folded(&mode, range), "module.exports =\nclass A {\u{2026}};\n");
}

#[test]
fn test_fold_comment() {
    let source = "a();\n\n/*\n * this is a comment.\n * it is really important.\n */\n\nb();\n";
    let mode = javascript_mode(source);

    assert_eq!(foldable_rows(&mode), vec![2]);
    let range = mode.fold_range_at_row(2).unwrap();
    let text = folded(&mode, range);
    assert_eq!(text, "a();\n\n/*\u{2026}*/\n\nb();\n");
}

#[test]
fn test_multiline_call_arguments() {
    let source = "foo(\n  1,\n  2\n);\n";
    let mode = javascript_mode(source);
    let range = mode.fold_range_at_row(0).unwrap();
    assert_eq!(range, Range::new(Point::new(0, 4), Point::new(3, 0)));
    assert_eq!(folded(&mode, range), "foo(\u{2026});\n");
}

#[test]
fn test_indent_levels() {
    let mode = javascript_mode(CLASS);
    assert_eq!(
        mode.foldable_ranges_at_indent_level(0),
        vec![Range::new(Point::new(1, 9), Point::new(5, 0))]
    );
    assert_eq!(
        mode.foldable_ranges_at_indent_level(1),
        vec![Range::new(Point::new(2, 10), Point::new(4, 2))]
    );
    assert_eq!(mode.foldable_ranges().len(), 2);
}

#[test]
fn test_ranges_sorted_by_start_row() {
    let source = "if (a) {\n  b();\n}\nif (c) {\n  d(\n    e\n  );\n}\n";
    let mode = javascript_mode(source);
    let rows: Vec<usize> = mode.foldable_ranges().iter().map(|r| r.start.row).collect();
    assert_eq!(rows, vec![0, 3, 4]);
}

#[test]
fn test_editing_changes_foldability() {
    let mut mode = javascript_mode("a();\nb();\n");
    assert!(foldable_rows(&mode).is_empty());

    mode.replace_range(Range::new(Point::new(1, 0), Point::new(1, 0)), "if (x) {\n  y();\n}\n");
    assert_eq!(mode.source(), "a();\nif (x) {\n  y();\n}\nb();\n");
    assert_eq!(foldable_rows(&mode), vec![1]);

    mode.replace_range(Range::new(Point::new(1, 0), Point::new(4, 0)), "");
    assert!(foldable_rows(&mode).is_empty());
}
