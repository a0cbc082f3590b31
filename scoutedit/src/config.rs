use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Name of the project-local configuration file
pub const LOCAL_CONFIG_FILE: &str = ".scoutedit.yaml";

/// How file bytes that are not valid UTF-8 are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Undecodable bytes become U+FFFD and the file is still processed
    #[default]
    Lossy,
    /// Undecodable bytes make the file fail with an encoding error
    FailFast,
}

/// Configuration for search, enumeration and tree-wide replacement.
///
/// # Configuration Locations
///
/// Files are merged in order, later ones overriding earlier ones:
/// 1. Global `$CONFIG_DIR/scoutedit/config.yaml`
/// 2. Local `.scoutedit.yaml` in the current directory
/// 3. Custom config file specified via `--config`
///
/// # Configuration Format
///
/// ```yaml
/// # Search pattern (regex, `.` also matches newlines)
/// pattern: "TODO|FIXME"
///
/// # Root directory; every other path is relative to it
/// root_path: "."
///
/// # Subtree of the root to walk
/// relative_path: "src"
///
/// # Globs (brace groups and ** are supported)
/// include_patterns: ["**/*.{rs,toml}"]
/// exclude_patterns: ["**/generated/**"]
///
/// # Extra gitignore-style rules, applied after the root's .gitignore
/// ignore_patterns: ["target/", "*.log"]
/// use_gitignore: true
///
/// restrict_to_code_files: false
/// follow_symlinks: true
/// context_before: 2
/// context_after: 2
/// thread_count: 4
/// log_level: "info"
/// encoding_mode: "lossy"
/// ```
///
/// Command-line values take precedence over file values, see
/// [`SearchConfig::merge_with_cli`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// The search pattern
    pub pattern: String,

    /// Root directory every relative path is resolved against
    pub root_path: PathBuf,

    /// Start of the walk, relative to the root (empty walks the whole root)
    pub relative_path: PathBuf,

    /// If non-empty, a file must match at least one of these globs
    pub include_patterns: Vec<String>,

    /// A file matching any of these globs is skipped
    pub exclude_patterns: Vec<String>,

    /// Gitignore-style rules; these also prune directories before descent
    pub ignore_patterns: Vec<String>,

    /// Whether the root's `.gitignore` is read
    pub use_gitignore: bool,

    /// Only keep files with a recognized source or text extension
    pub restrict_to_code_files: bool,

    /// Whether symlinks are followed during the walk
    pub follow_symlinks: bool,

    /// Number of context lines to show before each match
    pub context_before: usize,

    /// Number of context lines to show after each match
    pub context_after: usize,

    /// Number of threads to use; defaults to the number of CPU cores
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Handling of invalid UTF-8
    pub encoding_mode: EncodingMode,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            root_path: PathBuf::from("."),
            relative_path: PathBuf::new(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            ignore_patterns: Vec::new(),
            use_gitignore: true,
            restrict_to_code_files: false,
            follow_symlinks: true,
            context_before: 0,
            context_after: 0,
            thread_count: default_thread_count(),
            log_level: default_log_level(),
            encoding_mode: EncodingMode::default(),
        }
    }
}

impl SearchConfig {
    /// A default configuration searching `root_path` for `pattern`
    pub fn new(pattern: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            pattern: pattern.into(),
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file.
    ///
    /// An explicitly requested file that does not exist is an error; the
    /// default locations are simply skipped when absent.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
        }

        let mut builder = ConfigBuilder::builder();

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("scoutedit/config.yaml")),
            // Local config
            Some(PathBuf::from(LOCAL_CONFIG_FILE)),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli_config: SearchConfig) -> Self {
        let defaults = SearchConfig::default();

        if !cli_config.pattern.is_empty() {
            self.pattern = cli_config.pattern;
        }
        if cli_config.root_path != defaults.root_path {
            self.root_path = cli_config.root_path;
        }
        if !cli_config.relative_path.as_os_str().is_empty() {
            self.relative_path = cli_config.relative_path;
        }
        if !cli_config.include_patterns.is_empty() {
            self.include_patterns = cli_config.include_patterns;
        }
        if !cli_config.exclude_patterns.is_empty() {
            self.exclude_patterns = cli_config.exclude_patterns;
        }
        if !cli_config.ignore_patterns.is_empty() {
            self.ignore_patterns = cli_config.ignore_patterns;
        }
        // Switches can only be turned away from their defaults on the command line
        if !cli_config.use_gitignore {
            self.use_gitignore = false;
        }
        if cli_config.restrict_to_code_files {
            self.restrict_to_code_files = true;
        }
        if !cli_config.follow_symlinks {
            self.follow_symlinks = false;
        }
        if cli_config.context_before != 0 {
            self.context_before = cli_config.context_before;
        }
        if cli_config.context_after != 0 {
            self.context_after = cli_config.context_after;
        }
        if cli_config.thread_count != defaults.thread_count {
            self.thread_count = cli_config.thread_count;
        }
        if cli_config.log_level != defaults.log_level {
            self.log_level = cli_config.log_level;
        }
        if cli_config.encoding_mode != defaults.encoding_mode {
            self.encoding_mode = cli_config.encoding_mode;
        }
        self
    }
}
