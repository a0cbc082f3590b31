use rayon::prelude::*;
use serde::Serialize;
use similar::TextDiff;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, trace, warn};

use super::engine::{ReplaceMode, ReplacementResult, Replacer};
use super::ReplacementConfig;
use crate::config::{EncodingMode, SearchConfig};
use crate::errors::{unify_path, SearchError, SearchResult};
use crate::results::ReplaceReport;
use crate::root::{normalize_separators, ProjectRoot};
use crate::search::{build_pool, chunk_size};
use crate::storage::{read_text, write_text_atomic};
use crate::walk::FileEnumerator;

/// Default backup location, relative to the project root
pub const DEFAULT_BACKUP_DIR: &str = ".scoutedit/backups";

/// What to replace and how strictly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceRequest {
    pub needle: String,
    pub replacement: String,
    pub mode: ReplaceMode,
    pub allow_multiple: bool,
}

impl ReplaceRequest {
    pub fn literal(needle: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            replacement: replacement.into(),
            mode: ReplaceMode::Literal,
            allow_multiple: false,
        }
    }

    pub fn regex(needle: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            mode: ReplaceMode::Regex,
            ..Self::literal(needle, replacement)
        }
    }

    pub fn allow_multiple(mut self, allow: bool) -> Self {
        self.allow_multiple = allow;
        self
    }

    /// Compiles the request once for any number of files
    pub fn replacer(&self) -> SearchResult<Replacer> {
        Replacer::new(&self.needle, &self.replacement, self.mode, self.allow_multiple)
    }
}

/// The effect of an edit on one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReplacement {
    /// Path relative to the project root
    pub path: String,
    pub match_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_match_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    /// Unified diff of the change
    pub diff: String,
    /// False for dry runs
    pub written: bool,
}

/// Unified diff between two versions of a file
pub fn unified_diff(old: &str, new: &str, path: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}

/// Replaces text in one file under `root`.
///
/// Runs the replacement engine on the file content, then (unless this is a
/// dry run) backs up the old content and writes the new content atomically.
pub fn replace_in_file(
    root: &ProjectRoot,
    relative: impl AsRef<Path>,
    request: &ReplaceRequest,
    config: &ReplacementConfig,
) -> SearchResult<FileReplacement> {
    let replacer = request.replacer()?;
    edit_file(root, relative, config, |content| replacer.apply(content))
}

/// Applies an arbitrary content edit to one file with the same backup,
/// diff and write-back handling as [`replace_in_file`].
pub fn edit_file<F>(
    root: &ProjectRoot,
    relative: impl AsRef<Path>,
    config: &ReplacementConfig,
    edit: F,
) -> SearchResult<FileReplacement>
where
    F: FnOnce(&str) -> SearchResult<ReplacementResult>,
{
    let relative = relative.as_ref();
    let path = root.resolve(relative)?;
    if path.is_dir() {
        return Err(SearchError::not_a_file(relative));
    }
    let rel = root
        .relative_of(&path)
        .unwrap_or_else(|| normalize_separators(relative));
    // Edit the link target; renaming over a symlink would replace the link
    let target = unify_path(&path);

    let content = read_text(&target, EncodingMode::FailFast)?;
    let result = edit(&content)?;
    commit(root, &target, rel, &content, result, config)
}

fn commit(
    root: &ProjectRoot,
    path: &Path,
    rel: String,
    original: &str,
    result: ReplacementResult,
    config: &ReplacementConfig,
) -> SearchResult<FileReplacement> {
    let diff = unified_diff(original, &result.updated_content, &rel);

    let (backup_path, written) = if config.dry_run {
        debug!("Dry run, leaving {} untouched", rel);
        (None, false)
    } else {
        let backup_path = if config.backup_enabled {
            Some(create_backup(root, path, &rel, config)?)
        } else {
            None
        };
        write_text_atomic(path, &result.updated_content, config.preserve_metadata)?;
        trace!("Replaced {} match(es) in {}", result.match_count, rel);
        (backup_path, true)
    };

    Ok(FileReplacement {
        path: rel,
        match_count: result.match_count,
        first_match_line: result.first_match_line,
        backup_path,
        diff,
        written,
    })
}

/// Copies the current file into the backup directory under a name derived
/// from its relative path and the current time, e.g. `src_lib.rs.1737267859`.
fn create_backup(
    root: &ProjectRoot,
    path: &Path,
    rel: &str,
    config: &ReplacementConfig,
) -> SearchResult<PathBuf> {
    let backup_dir = match &config.backup_dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => root.path().join(dir),
        None => root.path().join(DEFAULT_BACKUP_DIR),
    };
    fs::create_dir_all(&backup_dir).map_err(|e| SearchError::from_io(&backup_dir, e))?;

    let sanitized = rel.replace(['/', '\\'], "_");
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let mut backup_path = backup_dir.join(format!("{sanitized}.{timestamp}"));
    let mut attempt = 1;
    while backup_path.exists() {
        backup_path = backup_dir.join(format!("{sanitized}.{timestamp}-{attempt}"));
        attempt += 1;
    }

    fs::copy(path, &backup_path).map_err(|e| SearchError::from_io(path, e))?;
    debug!("Backed up {} to {}", rel, backup_path.display());
    Ok(backup_path)
}

enum FileOutcome {
    Changed(FileReplacement),
    Unchanged,
    Failed(SearchError),
}

/// Applies one replacement request to every file selected by `search_config`.
///
/// Files without a match are counted as scanned and left alone. Any other
/// per-file failure, including an ambiguous match, is recorded in the report
/// and does not stop the other files.
pub fn replace_in_tree(
    search_config: &SearchConfig,
    request: &ReplaceRequest,
    config: &ReplacementConfig,
) -> SearchResult<ReplaceReport> {
    info!("Starting {} replacement of {:?}", request.mode, request.needle);

    let replacer = request.replacer()?;
    let enumerator = FileEnumerator::from_config(search_config)?;
    let root = enumerator.root();
    let mut seen = HashSet::new();
    let files: Vec<(String, PathBuf)> = enumerator
        .enumerate(&search_config.relative_path)?
        .into_iter()
        .filter_map(|rel| {
            let target = unify_path(&root.path().join(&rel));
            if seen.insert(target.clone()) {
                Some((rel, target))
            } else {
                debug!("Skipping {}: same file as an earlier path", rel);
                None
            }
        })
        .collect();
    debug!("Found {} files to process", files.len());

    let thread_count = search_config.thread_count.get();
    let pool = build_pool(thread_count)?;
    let chunk = chunk_size(files.len(), thread_count);

    let outcomes: Vec<_> = pool.install(|| {
        files
            .par_chunks(chunk)
            .flat_map_iter(|paths| {
                paths.iter().map(|(rel, target)| {
                    let outcome = read_text(target, EncodingMode::FailFast)
                        .and_then(|content| {
                            let result = replacer.apply(&content)?;
                            commit(root, target, rel.clone(), &content, result, config)
                        });
                    let outcome = match outcome {
                        Ok(change) => FileOutcome::Changed(change),
                        Err(SearchError::PatternNotFound(_)) => FileOutcome::Unchanged,
                        Err(err) => FileOutcome::Failed(err),
                    };
                    (rel, outcome)
                })
            })
            .collect()
    });

    let mut report = ReplaceReport::new();
    for (rel, outcome) in outcomes {
        match outcome {
            FileOutcome::Changed(change) => report.add_change(change),
            FileOutcome::Unchanged => report.add_unchanged(),
            FileOutcome::Failed(err) => {
                warn!("Skipping {}: {}", rel, err);
                report.add_file_error(rel.as_str(), &err);
            }
        }
    }

    info!(
        "Replacement complete. {} replacements in {} files",
        report.summary.total_replacements, report.summary.files_changed
    );
    Ok(report)
}
