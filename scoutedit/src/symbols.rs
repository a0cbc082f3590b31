//! Edits located by symbol instead of by pattern.
//!
//! Symbols come from an outside provider (typically a language server) through
//! [`SymbolSource`]. Only their line ranges are used here; the edits
//! themselves are line-range edits from [`crate::lines`].
use serde::Serialize;
use std::path::Path;

use crate::errors::{SearchError, SearchResult};
use crate::lines::{insert_at_line, replace_lines};
use crate::replace::{edit_file, FileReplacement, ReplacementConfig, ReplacementResult};
use crate::root::{normalize_separators, ProjectRoot};

/// Source position range; lines are 1-based, columns 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRange {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    /// Provider-defined kind such as `function` or `class`
    pub kind: String,
    pub range: SourceRange,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Symbol>,
}

/// Provides the symbols defined in a file, in source order
pub trait SymbolSource {
    fn symbols(&self, relative_path: &str) -> SearchResult<Vec<Symbol>>;
}

/// Finds a symbol by a `/`-separated name path such as `Outer/inner`.
pub fn find_symbol<'a>(symbols: &'a [Symbol], name_path: &str) -> Option<&'a Symbol> {
    let mut names = name_path.split('/').filter(|s| !s.is_empty());
    let first = names.next()?;
    let mut current = symbols.iter().find(|s| s.name == first)?;
    for name in names {
        current = current.children.iter().find(|s| s.name == name)?;
    }
    Some(current)
}

/// Replaces every line of the symbol's definition with `body`
pub fn replace_symbol_body(
    content: &str,
    symbol: &Symbol,
    body: &str,
) -> SearchResult<ReplacementResult> {
    let range = symbol.range;
    Ok(ReplacementResult {
        updated_content: replace_lines(content, range.start_line, range.end_line, body)?,
        match_count: 1,
        first_match_line: Some(range.start_line),
    })
}

/// Inserts `text` on the lines directly above the symbol
pub fn insert_before_symbol(
    content: &str,
    symbol: &Symbol,
    text: &str,
) -> SearchResult<ReplacementResult> {
    let line = symbol.range.start_line;
    Ok(ReplacementResult {
        updated_content: insert_at_line(content, line, text)?,
        match_count: 1,
        first_match_line: Some(line),
    })
}

/// Inserts `text` on the lines directly below the symbol
pub fn insert_after_symbol(
    content: &str,
    symbol: &Symbol,
    text: &str,
) -> SearchResult<ReplacementResult> {
    let line = symbol.range.end_line + 1;
    Ok(ReplacementResult {
        updated_content: insert_at_line(content, line, text)?,
        match_count: 1,
        first_match_line: Some(line),
    })
}

/// A symbol-relative edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolEdit {
    ReplaceBody(String),
    InsertBefore(String),
    InsertAfter(String),
}

impl SymbolEdit {
    pub fn apply(&self, content: &str, symbol: &Symbol) -> SearchResult<ReplacementResult> {
        match self {
            SymbolEdit::ReplaceBody(body) => replace_symbol_body(content, symbol, body),
            SymbolEdit::InsertBefore(text) => insert_before_symbol(content, symbol, text),
            SymbolEdit::InsertAfter(text) => insert_after_symbol(content, symbol, text),
        }
    }
}

/// Locates `name_path` in a file through `source` and applies `edit` to the
/// file, with the usual backup and write-back handling.
pub fn edit_symbol(
    root: &ProjectRoot,
    source: &dyn SymbolSource,
    relative: impl AsRef<Path>,
    name_path: &str,
    edit: &SymbolEdit,
    config: &ReplacementConfig,
) -> SearchResult<FileReplacement> {
    let relative = relative.as_ref();
    let symbols = source.symbols(&normalize_separators(relative))?;
    let symbol = find_symbol(&symbols, name_path)
        .ok_or_else(|| SearchError::pattern_not_found(name_path))?;
    edit_file(root, relative, config, |content| edit.apply(content, symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    const SOURCE: &str = "struct Counter;\n\nimpl Counter {\n    fn bump(&mut self) {\n        todo!()\n    }\n}\n";

    fn symbol(name: &str, kind: &str, lines: (usize, usize), children: Vec<Symbol>) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: kind.to_string(),
            range: SourceRange {
                start_line: lines.0,
                start_col: 0,
                end_line: lines.1,
                end_col: 1,
            },
            children,
        }
    }

    fn outline() -> Vec<Symbol> {
        vec![
            symbol("Counter", "struct", (1, 1), vec![]),
            symbol(
                "impl Counter",
                "impl",
                (3, 7),
                vec![symbol("bump", "method", (4, 6), vec![])],
            ),
        ]
    }

    struct FixedSymbols(HashMap<String, Vec<Symbol>>);

    impl SymbolSource for FixedSymbols {
        fn symbols(&self, relative_path: &str) -> SearchResult<Vec<Symbol>> {
            self.0
                .get(relative_path)
                .cloned()
                .ok_or_else(|| SearchError::path_not_found(relative_path))
        }
    }

    #[test]
    fn test_find_symbol() {
        let symbols = outline();
        assert_eq!(find_symbol(&symbols, "Counter").map(|s| s.range.start_line), Some(1));
        assert_eq!(
            find_symbol(&symbols, "impl Counter/bump").map(|s| s.kind.as_str()),
            Some("method")
        );
        assert!(find_symbol(&symbols, "bump").is_none());
        assert!(find_symbol(&symbols, "impl Counter/missing").is_none());
    }

    #[test]
    fn test_replace_symbol_body() {
        let symbols = outline();
        let bump = find_symbol(&symbols, "impl Counter/bump").unwrap();
        let result =
            replace_symbol_body(SOURCE, bump, "    fn bump(&mut self) {}").unwrap();
        assert_eq!(
            result.updated_content,
            "struct Counter;\n\nimpl Counter {\n    fn bump(&mut self) {}\n}\n"
        );
        assert_eq!(result.first_match_line, Some(4));
    }

    #[test]
    fn test_insert_around_symbol() {
        let symbols = outline();
        let counter = find_symbol(&symbols, "Counter").unwrap();

        let result = insert_before_symbol(SOURCE, counter, "#[derive(Debug)]").unwrap();
        assert!(result.updated_content.starts_with("#[derive(Debug)]\nstruct Counter;\n"));

        let block = find_symbol(&symbols, "impl Counter").unwrap();
        let result = insert_after_symbol(SOURCE, block, "\nfn helper() {}\n").unwrap();
        assert!(result.updated_content.ends_with("}\n\nfn helper() {}\n"));
    }

    #[test]
    fn test_stale_range_is_rejected() {
        let stale = symbol("gone", "function", (40, 42), vec![]);
        assert!(matches!(
            replace_symbol_body(SOURCE, &stale, "x"),
            Err(SearchError::InvalidLineRange { .. })
        ));
    }

    #[test]
    fn test_edit_symbol_in_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/counter.rs"), SOURCE).unwrap();
        let root = ProjectRoot::new(dir.path()).unwrap();

        let source = FixedSymbols(HashMap::from([("src/counter.rs".to_string(), outline())]));
        let config = ReplacementConfig {
            backup_enabled: false,
            ..ReplacementConfig::default()
        };

        let change = edit_symbol(
            &root,
            &source,
            "src/counter.rs",
            "impl Counter/bump",
            &SymbolEdit::ReplaceBody("    fn bump(&mut self) {}".to_string()),
            &config,
        )
        .unwrap();
        assert!(change.written);
        assert!(fs::read_to_string(dir.path().join("src/counter.rs"))
            .unwrap()
            .contains("fn bump(&mut self) {}"));

        let err = edit_symbol(
            &root,
            &source,
            "src/counter.rs",
            "Nope",
            &SymbolEdit::InsertBefore("x".to_string()),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::PatternNotFound(_)));
    }
}
