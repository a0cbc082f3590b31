//! Safe text replacement.
//!
//! [`engine`] is pure: it takes content and returns new content plus a match
//! count, refusing to guess when the needle is missing or ambiguous.
//! [`file`] wraps it with path resolution, backups, diffs and atomic writes,
//! for a single file or for every file selected by a [`SearchConfig`].
//!
//! Files are always decoded strictly before an edit: a rewrite must keep
//! every byte outside the match, so a file that is not valid UTF-8 fails
//! with `EncodingError` instead of being saved with replacement characters.
//!
//! [`SearchConfig`]: crate::config::SearchConfig
use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod backref;
pub mod engine;
pub mod file;

pub use backref::{expand_backrefs, has_backrefs};
pub use engine::{compile_replace_pattern, replace_content, ReplaceMode, ReplacementResult, Replacer};
pub use file::{
    edit_file, replace_in_file, replace_in_tree, unified_diff, FileReplacement, ReplaceRequest,
    DEFAULT_BACKUP_DIR,
};

/// Configuration for replacement operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementConfig {
    /// Whether to create backups of modified files
    pub backup_enabled: bool,

    /// Directory for storing backups; relative paths are under the project root
    pub backup_dir: Option<PathBuf>,

    /// Whether to only show what would be changed without modifying files
    pub dry_run: bool,

    /// Whether to keep file permissions across the rewrite
    pub preserve_metadata: bool,
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        Self {
            backup_enabled: true,
            backup_dir: None,
            dry_run: false,
            preserve_metadata: true,
        }
    }
}

impl ReplacementConfig {
    /// Loads replacement settings from a YAML file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }

    pub fn merge_with_cli(&mut self, cli_config: ReplacementConfig) {
        // CLI options take precedence over config file
        if !cli_config.backup_enabled {
            self.backup_enabled = false;
        }
        self.dry_run |= cli_config.dry_run;
        if cli_config.backup_dir.is_some() {
            self.backup_dir = cli_config.backup_dir;
        }
        if !cli_config.preserve_metadata {
            self.preserve_metadata = false;
        }
    }
}
