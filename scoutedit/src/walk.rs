use ignore::{DirEntry, WalkBuilder};
use std::path::Path;
use tracing::{debug, info, trace, warn};

use crate::config::SearchConfig;
use crate::errors::SearchResult;
use crate::filters::{is_code_file, PathFilter};
use crate::ignore_spec::IgnoreSpec;
use crate::root::ProjectRoot;

/// Directory names that are never descended into, whatever the ignore rules say
pub const ALWAYS_PRUNED: &[&str] = &[".git", ".scoutedit"];

/// Filters applied while enumerating files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerateOptions {
    /// If non-empty, a file must match at least one of these globs
    pub include_patterns: Vec<String>,
    /// A file matching any of these globs is skipped
    pub exclude_patterns: Vec<String>,
    /// Gitignore-style rules applied after the root's `.gitignore`
    pub ignore_patterns: Vec<String>,
    pub use_gitignore: bool,
    pub restrict_to_code_files: bool,
    pub follow_symlinks: bool,
}

impl Default for EnumerateOptions {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            ignore_patterns: Vec::new(),
            use_gitignore: true,
            restrict_to_code_files: false,
            follow_symlinks: true,
        }
    }
}

impl From<&SearchConfig> for EnumerateOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            include_patterns: config.include_patterns.clone(),
            exclude_patterns: config.exclude_patterns.clone(),
            ignore_patterns: config.ignore_patterns.clone(),
            use_gitignore: config.use_gitignore,
            restrict_to_code_files: config.restrict_to_code_files,
            follow_symlinks: config.follow_symlinks,
        }
    }
}

/// Lists the files under a project root that pass the configured filters.
///
/// Ignored directories are pruned before the walker descends into them, so
/// their contents are never read. Symlinks are followed by default; a link
/// whose target lies outside the root is skipped, and link cycles are broken
/// by the walker's loop detection.
#[derive(Debug, Clone)]
pub struct FileEnumerator {
    root: ProjectRoot,
    include: PathFilter,
    exclude: PathFilter,
    ignore: IgnoreSpec,
    restrict_to_code_files: bool,
    follow_symlinks: bool,
}

impl FileEnumerator {
    /// Compiles the filters in `options` for a root
    pub fn new(root: ProjectRoot, options: &EnumerateOptions) -> SearchResult<Self> {
        let include = PathFilter::compile(&options.include_patterns)?;
        let exclude = PathFilter::compile(&options.exclude_patterns)?;
        let ignore =
            IgnoreSpec::from_root(root.path(), &options.ignore_patterns, options.use_gitignore)?;

        Ok(Self {
            root,
            include,
            exclude,
            ignore,
            restrict_to_code_files: options.restrict_to_code_files,
            follow_symlinks: options.follow_symlinks,
        })
    }

    /// Opens the configured root and compiles the configured filters
    pub fn from_config(config: &SearchConfig) -> SearchResult<Self> {
        let root = ProjectRoot::new(&config.root_path)?;
        Self::new(root, &EnumerateOptions::from(config))
    }

    /// Replaces the ignore rules, e.g. with a spec compiled by the caller
    pub fn with_ignore(mut self, ignore: IgnoreSpec) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn root(&self) -> &ProjectRoot {
        &self.root
    }

    /// Sorted relative paths of the accepted files under `start_relative`.
    ///
    /// If `start_relative` names a file, that file alone is considered.
    pub fn enumerate(&self, start_relative: impl AsRef<Path>) -> SearchResult<Vec<String>> {
        let start = self.root.resolve(start_relative)?;
        info!("Enumerating files under {}", start.display());

        if start.is_file() {
            let files = self
                .root
                .relative_of(&start)
                .filter(|rel| self.accepts(rel))
                .into_iter()
                .collect();
            return Ok(files);
        }

        let root = self.root.clone();
        let ignore = self.ignore.clone();
        let mut walker = WalkBuilder::new(&start);
        walker
            .standard_filters(false)
            .follow_links(self.follow_symlinks)
            .filter_entry(move |entry| should_visit(&root, &ignore, entry));

        let mut files = Vec::new();
        for result in walker.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let Some(rel) = self.root.relative_of(entry.path()) else {
                continue;
            };
            if self.accepts(&rel) {
                files.push(rel);
            } else {
                trace!("Filtered out {}", rel);
            }
        }

        files.sort();
        files.dedup();
        debug!("Enumerated {} files", files.len());
        Ok(files)
    }

    /// Applies the per-file checks in order: ignore, include, exclude, extension.
    fn accepts(&self, rel: &str) -> bool {
        if self.ignore.matches(rel) {
            return false;
        }
        if !self.include.is_empty() && !self.include.matches(rel) {
            return false;
        }
        if self.exclude.matches(rel) {
            return false;
        }
        !self.restrict_to_code_files || is_code_file(rel)
    }
}

/// Lists files under `root/start_relative` with the given filters
pub fn enumerate(
    root: impl AsRef<Path>,
    start_relative: impl AsRef<Path>,
    options: &EnumerateOptions,
) -> SearchResult<Vec<String>> {
    let root = ProjectRoot::new(root)?;
    FileEnumerator::new(root, options)?.enumerate(start_relative)
}

fn should_visit(root: &ProjectRoot, ignore: &IgnoreSpec, entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let path = entry.path();
    if entry.path_is_symlink() && !root.contains(path) {
        warn!("Skipping {}: link target is outside the root", path.display());
        return false;
    }
    if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
        return true;
    }
    match root.relative_of(path) {
        Some(rel) => !is_pruned_dir(ignore, &rel),
        None => true,
    }
}

fn is_pruned_dir(ignore: &IgnoreSpec, rel: &str) -> bool {
    let name = rel.rsplit('/').next().unwrap_or(rel);
    if ALWAYS_PRUNED.contains(&name) {
        trace!("Pruning {}", rel);
        return true;
    }
    if ignore.matches_dir(rel) {
        debug!("Pruning ignored directory {}", rel);
        return true;
    }
    false
}
