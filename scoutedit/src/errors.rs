//! Error types shared by every scoutedit operation.
//!
//! Every failure is reported synchronously as a structured [`SearchError`]:
//! a stable kind (see [`SearchError::kind`]), a human message from `Display`,
//! and the path or pattern that caused it. Nothing here is retried; not-found
//! and ambiguity errors are conditions the caller is expected to correct.
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search and replace operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during enumeration, search and replacement
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
    #[error("Path {path} escapes the project root {root}")]
    PathEscapesRoot { path: PathBuf, root: PathBuf },
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Not a file: {0}")]
    NotAFile(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("No match found for pattern '{0}'")]
    PatternNotFound(String),
    #[error("Pattern '{pattern}' matched {count} times; multiple replacements were not allowed")]
    AmbiguousMatch { pattern: String, count: usize },
    #[error("Pattern '{pattern}' can match several overlapping spans inside the multi-line match at line {line}")]
    AmbiguousOverlap { pattern: String, line: usize },
    #[error("Invalid line range {start}-{end}: content has {total} lines")]
    InvalidLineRange {
        start: usize,
        end: usize,
        total: usize,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
}

/// Canonicalize the path and strip UNC prefixes so that
/// comparisons on Windows are consistent.
pub fn unify_path(original: &Path) -> PathBuf {
    let canonical = original
        .canonicalize()
        .unwrap_or_else(|_| original.to_path_buf());
    strip_unc_prefix(&canonical)
}

/// Strips the Windows UNC prefix (\\?\) from a path if present
fn strip_unc_prefix(p: &Path) -> PathBuf {
    let s = p.display().to_string();
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        PathBuf::from(stripped)
    } else {
        p.to_path_buf()
    }
}

impl SearchError {
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    pub fn path_escapes_root(path: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self::PathEscapesRoot {
            path: path.into(),
            root: root.into(),
        }
    }

    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::NotAFile(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }

    pub fn pattern_not_found(pattern: impl Into<String>) -> Self {
        Self::PatternNotFound(pattern.into())
    }

    pub fn ambiguous_match(pattern: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousMatch {
            pattern: pattern.into(),
            count,
        }
    }

    pub fn ambiguous_overlap(pattern: impl Into<String>, line: usize) -> Self {
        Self::AmbiguousOverlap {
            pattern: pattern.into(),
            line,
        }
    }

    pub fn invalid_line_range(start: usize, end: usize, total: usize) -> Self {
        Self::InvalidLineRange { start, end, total }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::string::FromUtf8Error) -> Self {
        let path = path.into();
        let unified = unify_path(&path);
        Self::EncodingError {
            path: unified,
            source,
        }
    }

    /// Maps an I/O failure on a known path to the most specific error kind.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::path_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PathNotFound(_) => "PathNotFound",
            Self::PathEscapesRoot { .. } => "PathEscapesRoot",
            Self::NotADirectory(_) => "NotADirectory",
            Self::NotAFile(_) => "NotAFile",
            Self::PermissionDenied(_) => "PermissionDenied",
            Self::InvalidPattern { .. } => "InvalidPattern",
            Self::PatternNotFound(_) => "PatternNotFound",
            Self::AmbiguousMatch { .. } => "AmbiguousMatch",
            Self::AmbiguousOverlap { .. } => "AmbiguousOverlap",
            Self::InvalidLineRange { .. } => "InvalidLineRange",
            Self::ConfigError(_) => "ConfigError",
            Self::IoError(_) => "IoError",
            Self::JsonError(_) => "JsonError",
            Self::EncodingError { .. } => "EncodingError",
        }
    }
}
