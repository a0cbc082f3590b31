//! Glob-based path filtering.
//!
//! A user pattern goes through two pure steps before it is compiled:
//!
//! 1. **Brace expansion**: `src/{a,b}/*.{rs,toml}` becomes the ordered list
//!    `src/a/*.rs`, `src/a/*.toml`, `src/b/*.rs`, `src/b/*.toml`. The first
//!    unresolved group is expanded, then the next, until none remain. Nested
//!    groups are not supported.
//! 2. **Recursive-wildcard forms**: a concrete glob containing `**` is
//!    accepted in up to three forms: as written, with every `/**/`
//!    collapsed to `/` (so `**` can stand for zero directories), and, when it
//!    starts with `**/`, with that prefix removed (so `**/*.py` also matches
//!    `bar.py` at the root).
//!
//! Each form is compiled with `glob` so that `*` and `?` never cross a `/`.
use glob::{MatchOptions, Pattern};
use std::path::Path;

use crate::errors::{SearchError, SearchResult};
use crate::root::normalize_separators;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Extensions treated as text or source code when enumeration is restricted
/// to code files.
pub const CODE_EXTENSIONS: &[&str] = &[
    "bash", "c", "cc", "cfg", "cjs", "clj", "cmake", "conf", "cpp", "cs", "css", "cxx", "dart",
    "el", "erl", "ex", "exs", "fs", "go", "gradle", "groovy", "h", "hpp", "hs", "html", "ini",
    "java", "jl", "js", "json", "jsx", "kt", "kts", "lua", "m", "md", "mjs", "ml", "mli", "nix",
    "php", "pl", "pm", "proto", "ps1", "py", "pyi", "r", "rb", "rs", "rst", "sass", "scala",
    "scss", "sh", "sql", "svelte", "swift", "tex", "tf", "toml", "ts", "tsx", "txt", "vue", "xml",
    "yaml", "yml", "zig", "zsh",
];

/// Which of the equivalent forms of a `**` glob a compiled pattern represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobForm {
    /// The glob exactly as written
    Literal,
    /// `/**/` collapsed to `/`
    Collapsed,
    /// Leading `**/` removed
    RootAnchored,
}

/// One concrete, brace-free glob and the forms it was compiled into
#[derive(Debug, Clone)]
pub struct CompiledGlob {
    source: String,
    forms: Vec<(GlobForm, Pattern)>,
}

impl CompiledGlob {
    /// Compiles a brace-free glob into its accepted forms.
    pub fn new(glob: &str) -> SearchResult<Self> {
        let forms = glob_forms(glob)
            .into_iter()
            .map(|(form, text)| {
                Pattern::new(&text)
                    .map(|p| (form, p))
                    .map_err(|e| SearchError::invalid_pattern(glob, e.msg))
            })
            .collect::<SearchResult<Vec<_>>>()?;
        Ok(Self {
            source: glob.to_string(),
            forms,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn forms(&self) -> impl Iterator<Item = GlobForm> + '_ {
        self.forms.iter().map(|(form, _)| *form)
    }

    /// Matches an already-normalized relative path.
    pub fn matches_str(&self, path: &str) -> bool {
        self.forms
            .iter()
            .any(|(_, pattern)| pattern.matches_with(path, MATCH_OPTIONS))
    }
}

/// A set of globs; a path passes if any glob accepts it.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    globs: Vec<CompiledGlob>,
}

impl PathFilter {
    /// Compiles each pattern after brace expansion. An empty list yields a
    /// filter that matches nothing.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> SearchResult<Self> {
        let mut globs = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            for concrete in expand_braces(pattern) {
                globs.push(CompiledGlob::new(&concrete)?);
            }
        }
        Ok(Self { globs })
    }

    /// Compiles a comma-joined pattern list such as `"*.rs,src/{a,b}/*.py"`.
    pub fn from_comma_list(list: &str) -> SearchResult<Self> {
        Self::compile(&split_pattern_list(list))
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }

    pub fn globs(&self) -> &[CompiledGlob] {
        &self.globs
    }

    /// True if any compiled glob matches the relative path.
    pub fn matches(&self, path: impl AsRef<Path>) -> bool {
        if self.globs.is_empty() {
            return false;
        }
        let normalized = normalize_separators(path.as_ref());
        self.globs.iter().any(|g| g.matches_str(&normalized))
    }
}

/// Expands brace groups left to right into an ordered list of globs.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close) = pattern[open..].find('}').map(|i| open + i) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let body = &pattern[open + 1..close];
    let suffix = &pattern[close + 1..];

    body.split(',')
        .flat_map(|alt| expand_braces(&format!("{prefix}{alt}{suffix}")))
        .collect()
}

/// Splits a comma-joined list of globs, ignoring commas inside braces.
pub fn split_pattern_list(list: &str) -> Vec<String> {
    let mut patterns = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in list.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                if !current.trim().is_empty() {
                    patterns.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        patterns.push(current.trim().to_string());
    }
    patterns
}

fn glob_forms(glob: &str) -> Vec<(GlobForm, String)> {
    let mut forms = vec![(GlobForm::Literal, glob.to_string())];
    if !glob.contains("**") {
        return forms;
    }

    let mut collapsed = glob.to_string();
    while collapsed.contains("/**/") {
        collapsed = collapsed.replace("/**/", "/");
    }
    if collapsed != glob {
        forms.push((GlobForm::Collapsed, collapsed));
    }
    if let Some(stripped) = glob.strip_prefix("**/") {
        forms.push((GlobForm::RootAnchored, stripped.to_string()));
    }
    forms
}

/// Checks whether a file's extension is in the recognized code set
pub fn is_code_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            CODE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(patterns: &[&str]) -> PathFilter {
        PathFilter::compile(patterns).unwrap()
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(expand_braces("*.rs"), vec!["*.rs"]);
        assert_eq!(expand_braces("{a,b}/x"), vec!["a/x", "b/x"]);
        assert_eq!(
            expand_braces("src/{a,b}/*.{rs,toml}"),
            vec!["src/a/*.rs", "src/a/*.toml", "src/b/*.rs", "src/b/*.toml"]
        );
        // An unterminated group is left alone
        assert_eq!(expand_braces("a{b"), vec!["a{b"]);
    }

    #[test]
    fn test_split_pattern_list() {
        assert_eq!(
            split_pattern_list("*.rs, src/{a,b}/*.py ,,docs/**"),
            vec!["*.rs", "src/{a,b}/*.py", "docs/**"]
        );
    }

    #[test]
    fn test_single_segment_wildcards() {
        let f = filter(&["src/*.rs", "?.txt"]);
        assert!(f.matches("src/main.rs"));
        assert!(!f.matches("src/nested/main.rs"));
        assert!(f.matches("a.txt"));
        assert!(!f.matches("ab.txt"));
    }

    #[test]
    fn test_brace_pattern_matches_each_alternative() {
        let f = filter(&["{a,b}/x"]);
        assert!(f.matches("a/x"));
        assert!(f.matches("b/x"));
        assert!(!f.matches("c/x"));
    }

    #[test]
    fn test_recursive_wildcard() {
        let f = filter(&["**/*.py"]);
        assert!(f.matches("foo/bar.py"));
        assert!(f.matches("bar.py"));
        assert!(f.matches("a/b/c.py"));
        assert!(!f.matches("a/b/c.rs"));

        let f = filter(&["src/**/mod.rs"]);
        assert!(f.matches("src/mod.rs"));
        assert!(f.matches("src/a/b/mod.rs"));
        assert!(!f.matches("lib/a/mod.rs"));
    }

    #[test]
    fn test_glob_forms() {
        let glob = CompiledGlob::new("**/a/**/b.rs").unwrap();
        let forms: Vec<_> = glob.forms().collect();
        assert_eq!(
            forms,
            vec![GlobForm::Literal, GlobForm::Collapsed, GlobForm::RootAnchored]
        );

        let glob = CompiledGlob::new("*.rs").unwrap();
        assert_eq!(glob.forms().count(), 1);
    }

    #[test]
    fn test_empty_filter_matches_nothing() {
        let f = PathFilter::compile::<&str>(&[]).unwrap();
        assert!(f.is_empty());
        assert!(!f.matches("anything.rs"));
    }

    #[test]
    fn test_windows_separators_are_normalized() {
        let f = filter(&["src/*.rs"]);
        assert!(f.matches(Path::new("./src/main.rs")));
    }

    #[test]
    fn test_invalid_glob() {
        let err = PathFilter::compile(&["src/a**b.rs"]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidPattern { .. }));
    }

    #[test]
    fn test_is_code_file() {
        assert!(is_code_file("src/main.rs"));
        assert!(is_code_file("lib/Module.PY"));
        assert!(!is_code_file("image.png"));
        assert!(!is_code_file("Makefile"));
    }
}
