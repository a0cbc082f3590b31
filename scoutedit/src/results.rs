//! Report types for multi-file operations.
//!
//! Reports own their data and are merged by value. Per-file entries live in
//! `BTreeMap`s keyed by the `/`-separated relative path, so the serialized
//! order is the path order no matter which worker finished first.
use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::SearchError;
use crate::lines::{ContextBlock, MatchSpan};
use crate::replace::FileReplacement;

/// Represents a single match in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// Lines covered by the match
    pub span: MatchSpan,
    /// The matched lines plus their labelled context
    pub lines: ContextBlock,
}

/// Represents all matches found in a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    /// Path relative to the project root
    pub path: String,
    /// All matches found in the file, in content order
    pub matches: Vec<Match>,
}

/// A file that could not be processed during a multi-file operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub kind: String,
    pub message: String,
}

impl From<&SearchError> for FileError {
    fn from(err: &SearchError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    /// Files read, including ones that failed
    pub files_scanned: usize,
    pub files_with_matches: usize,
    pub total_matches: usize,
}

/// Represents the complete search results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub summary: SearchSummary,
    pub matches: BTreeMap<String, Vec<Match>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, FileError>,
}

impl SearchReport {
    /// Creates a new empty report
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a file result; files without matches only count as scanned
    pub fn add_file_result(&mut self, file_result: FileResult) {
        self.summary.files_scanned += 1;
        if !file_result.matches.is_empty() {
            self.summary.files_with_matches += 1;
            self.summary.total_matches += file_result.matches.len();
            self.matches.insert(file_result.path, file_result.matches);
        }
    }

    /// Records a soft per-file failure
    pub fn add_file_error(&mut self, path: impl Into<String>, err: &SearchError) {
        self.summary.files_scanned += 1;
        self.errors.insert(path.into(), FileError::from(err));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSummary {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub total_replacements: usize,
}

/// Outcome of a tree-wide replacement
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaceReport {
    pub summary: ReplaceSummary,
    pub changes: BTreeMap<String, FileReplacement>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, FileError>,
}

impl ReplaceReport {
    pub fn new() -> Self {
        Default::default()
    }

    /// A file that was scanned but did not contain the needle
    pub fn add_unchanged(&mut self) {
        self.summary.files_scanned += 1;
    }

    pub fn add_change(&mut self, change: FileReplacement) {
        self.summary.files_scanned += 1;
        self.summary.files_changed += 1;
        self.summary.total_replacements += change.match_count;
        self.changes.insert(change.path.clone(), change);
    }

    pub fn add_file_error(&mut self, path: impl Into<String>, err: &SearchError) {
        self.summary.files_scanned += 1;
        self.errors.insert(path.into(), FileError::from(err));
    }
}
