use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::errors::{SearchError, SearchResult};

/// Name of the ignore source read from a project root
pub const IGNORE_FILE: &str = ".gitignore";

/// A compiled set of gitignore-style rules.
///
/// Built once per operation and dropped afterwards. Later rules override
/// earlier ones and `!` rules re-include paths. With no rules at all the matcher
/// is inactive and ignores nothing.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSpec {
    matcher: Option<Gitignore>,
}

impl IgnoreSpec {
    /// A spec that ignores nothing
    pub fn none() -> Self {
        Self { matcher: None }
    }

    /// Compiles rule lines; blank lines and `#` comments are skipped.
    pub fn compile<S: AsRef<str>>(root: &Path, rules: &[S]) -> SearchResult<Self> {
        let mut builder = GitignoreBuilder::new(root);
        let mut count = 0usize;

        for rule in rules {
            let rule = rule.as_ref().trim_end();
            if rule.trim().is_empty() || rule.starts_with('#') {
                continue;
            }
            builder
                .add_line(None, rule)
                .map_err(|e| SearchError::invalid_pattern(rule, e))?;
            count += 1;
        }

        if count == 0 {
            return Ok(Self::none());
        }

        let matcher = builder
            .build()
            .map_err(|e| SearchError::invalid_pattern(IGNORE_FILE, e))?;
        debug!("Compiled ignore spec with {} rules", count);
        Ok(Self {
            matcher: Some(matcher),
        })
    }

    /// Builds the matcher for a root from its `.gitignore` (when `use_gitignore`
    /// is set) followed by `extra_rules`, so the extra rules take precedence.
    pub fn from_root(root: &Path, extra_rules: &[String], use_gitignore: bool) -> SearchResult<Self> {
        let mut rules: Vec<String> = Vec::new();

        if use_gitignore {
            let source = root.join(IGNORE_FILE);
            if source.is_file() {
                let content = fs::read_to_string(&source).map_err(|e| SearchError::from_io(&source, e))?;
                debug!("Loaded ignore rules from {}", source.display());
                rules.extend(content.lines().map(str::to_string));
            }
        }
        rules.extend(extra_rules.iter().cloned());

        Self::compile(root, &rules)
    }

    /// Whether any rules are loaded
    pub fn is_active(&self) -> bool {
        self.matcher.is_some()
    }

    /// True if a file at the relative path is ignored, either directly or
    /// because one of its parent directories is.
    pub fn matches(&self, relative: impl AsRef<Path>) -> bool {
        self.matched(relative.as_ref(), false)
    }

    /// True if a directory at the relative path is ignored.
    pub fn matches_dir(&self, relative: impl AsRef<Path>) -> bool {
        self.matched(relative.as_ref(), true)
    }

    fn matched(&self, relative: &Path, is_dir: bool) -> bool {
        let Some(ref gi) = self.matcher else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            return false;
        }
        if relative.has_root() {
            return gi.matched(relative, is_dir).is_ignore();
        }
        gi.matched_path_or_any_parents(relative, is_dir).is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_rules_ignores_nothing() {
        let temp = TempDir::new().unwrap();
        let spec = IgnoreSpec::compile::<&str>(temp.path(), &[]).unwrap();
        assert!(!spec.is_active());
        assert!(!spec.matches("anything.rs"));

        let spec = IgnoreSpec::compile(temp.path(), &["# only a comment", "   "]).unwrap();
        assert!(!spec.is_active());
    }

    #[test]
    fn test_directory_rule_covers_children() {
        let temp = TempDir::new().unwrap();
        let spec = IgnoreSpec::compile(temp.path(), &["build/"]).unwrap();
        assert!(spec.matches_dir("build"));
        assert!(spec.matches("build/anything"));
        assert!(spec.matches("build/deep/nested/file.o"));
        assert!(!spec.matches("src/build.rs"));
        // A plain file named `build` is not a directory
        assert!(!spec.matches("build"));
    }

    #[test]
    fn test_negation_and_precedence() {
        let temp = TempDir::new().unwrap();
        let spec = IgnoreSpec::compile(temp.path(), &["*.log", "!keep.log"]).unwrap();
        assert!(spec.matches("debug.log"));
        assert!(!spec.matches("keep.log"));

        // Later rule wins
        let spec = IgnoreSpec::compile(temp.path(), &["!keep.log", "*.log"]).unwrap();
        assert!(spec.matches("keep.log"));
    }

    #[test]
    fn test_from_root_reads_gitignore() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".gitignore"), "# deps\nnode_modules/\n*.tmp\n").unwrap();

        let spec = IgnoreSpec::from_root(temp.path(), &[], true).unwrap();
        assert!(spec.matches_dir("node_modules"));
        assert!(spec.matches("scratch.tmp"));
        assert!(!spec.matches("src/index.js"));

        let spec = IgnoreSpec::from_root(temp.path(), &["!scratch.tmp".to_string()], true).unwrap();
        assert!(!spec.matches("scratch.tmp"));

        let spec = IgnoreSpec::from_root(temp.path(), &[], false).unwrap();
        assert!(!spec.is_active());
    }
}
