use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use scoutedit::{
    config::{EncodingMode, SearchConfig},
    filters::split_pattern_list,
    lines::LineKind,
    replace::{replace_in_file, replace_in_tree, ReplaceRequest, ReplacementConfig},
    results::{ReplaceReport, SearchReport},
    search,
    walk::FileEnumerator,
    FileReplacement, ProjectRoot, SearchError,
};
use serde::Serialize;
use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod diff_utils;

use diff_utils::print_colored_diff;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file, merged over the global and local config files
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// Which files an operation looks at
#[derive(Args, Default)]
struct ScopeArgs {
    /// Project root; all other paths are relative to it
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    /// Subdirectory or file of the root to start from
    #[arg(long)]
    path: Option<PathBuf>,

    /// Only include files matching these globs (comma-separated or repeated)
    #[arg(long)]
    include: Vec<String>,

    /// Skip files matching these globs (comma-separated or repeated)
    #[arg(long)]
    exclude: Vec<String>,

    /// Extra gitignore-style rules
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Do not read the root's .gitignore
    #[arg(long)]
    no_gitignore: bool,

    /// Only consider files with a known source or text extension
    #[arg(long)]
    code_only: bool,

    /// Do not follow symbolic links
    #[arg(long)]
    no_follow_symlinks: bool,

    /// Number of threads to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// How searches handle invalid UTF-8 (lossy|failfast); edits always require valid UTF-8
    #[arg(long)]
    encoding: Option<String>,
}

/// What to replace and how the change is written back
#[derive(Args)]
struct ReplaceArgs {
    /// Text or regex to replace
    #[arg(short = 'p', long)]
    pattern: String,

    /// Replacement text; in regex mode `$!N` inserts capture group N
    #[arg(short = 'r', long)]
    replacement: String,

    /// Treat the pattern as a regular expression
    #[arg(long)]
    regex: bool,

    /// Allow more than one match per file
    #[arg(short = 'm', long)]
    multiple: bool,

    /// Show the diff without changing any file
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Do not keep a backup of changed files
    #[arg(long)]
    no_backup: bool,

    /// Where backups go (default: <root>/.scoutedit/backups)
    #[arg(long)]
    backup_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search files for a regex
    Search {
        /// Regular expression; `.` also matches newlines
        pattern: String,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Number of context lines before each match
        #[arg(short = 'B', long, default_value = "0")]
        context_before: usize,

        /// Number of context lines after each match
        #[arg(short = 'A', long, default_value = "0")]
        context_after: usize,

        /// Show only statistics, not matches
        #[arg(short, long)]
        stats: bool,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List the files an operation would look at
    Files {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Replace text in a single file
    Replace {
        /// File to edit, relative to the root
        file: PathBuf,

        /// Project root
        #[arg(short = 'd', long)]
        root: Option<PathBuf>,

        #[command(flatten)]
        args: ReplaceArgs,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Replace text in every file in scope
    ReplaceAll {
        #[command(flatten)]
        scope: ScopeArgs,

        #[command(flatten)]
        args: ReplaceArgs,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let kind = err
                .downcast_ref::<SearchError>()
                .map_or("Error", SearchError::kind);
            eprintln!("{} {:#}", format!("error[{kind}]:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let file_config = SearchConfig::load_from(cli.config.as_deref())
        .map_err(|e| SearchError::config_error(e.to_string()))?;
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| file_config.log_level.clone());
    init_tracing(&log_level);

    match cli.command {
        Commands::Search {
            pattern,
            scope,
            context_before,
            context_after,
            stats,
            format,
        } => {
            let config = file_config.merge_with_cli(SearchConfig {
                pattern,
                context_before,
                context_after,
                ..scope.to_config()?
            });
            let report = search(&config)?;
            match format {
                OutputFormat::Text => print_search_report(&report, stats),
                _ => emit(&report, format)?,
            }
            Ok(())
        }
        Commands::Files { scope, format } => {
            let config = file_config.merge_with_cli(scope.to_config()?);
            let files = FileEnumerator::from_config(&config)?.enumerate(&config.relative_path)?;
            match format {
                OutputFormat::Text => files.iter().for_each(|f| println!("{f}")),
                _ => emit(&files, format)?,
            }
            Ok(())
        }
        Commands::Replace {
            file,
            root,
            args,
            format,
        } => {
            let root_path = root.unwrap_or_else(|| file_config.root_path.clone());
            let root = ProjectRoot::new(&root_path)?;
            let replace_config = args.to_config(cli.config.as_ref())?;
            let change = replace_in_file(&root, &file, &args.to_request(), &replace_config)?;
            match format {
                OutputFormat::Text => print_change(&change),
                _ => emit(&change, format)?,
            }
            Ok(())
        }
        Commands::ReplaceAll {
            scope,
            args,
            format,
        } => {
            let config = file_config.merge_with_cli(scope.to_config()?);
            let replace_config = args.to_config(cli.config.as_ref())?;
            let report = replace_in_tree(&config, &args.to_request(), &replace_config)?;
            match format {
                OutputFormat::Text => print_replace_report(&report),
                _ => emit(&report, format)?,
            }
            Ok(())
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

impl ScopeArgs {
    /// CLI values in config form; unset options keep their defaults so that
    /// `merge_with_cli` leaves file values in place.
    fn to_config(&self) -> Result<SearchConfig> {
        let defaults = SearchConfig::default();
        let encoding_mode = match self.encoding.as_deref().map(str::to_lowercase).as_deref() {
            None => defaults.encoding_mode,
            Some("lossy") => EncodingMode::Lossy,
            Some("failfast") => EncodingMode::FailFast,
            Some(other) => {
                return Err(SearchError::config_error(format!(
                    "Unknown encoding '{other}', expected lossy or failfast"
                ))
                .into())
            }
        };

        Ok(SearchConfig {
            root_path: self.root.clone().unwrap_or(defaults.root_path.clone()),
            relative_path: self.path.clone().unwrap_or_default(),
            include_patterns: split_all(&self.include),
            exclude_patterns: split_all(&self.exclude),
            ignore_patterns: self.ignore.clone(),
            use_gitignore: !self.no_gitignore,
            restrict_to_code_files: self.code_only,
            follow_symlinks: !self.no_follow_symlinks,
            thread_count: self.threads.unwrap_or(defaults.thread_count),
            encoding_mode,
            ..defaults
        })
    }
}

impl ReplaceArgs {
    fn to_request(&self) -> ReplaceRequest {
        let request = if self.regex {
            ReplaceRequest::regex(&self.pattern, &self.replacement)
        } else {
            ReplaceRequest::literal(&self.pattern, &self.replacement)
        };
        request.allow_multiple(self.multiple)
    }

    fn to_config(&self, config_path: Option<&PathBuf>) -> Result<ReplacementConfig> {
        let mut config = match config_path {
            Some(path) => ReplacementConfig::load_from(path).map_err(|e| {
                SearchError::config_error(format!("Failed to load {}: {e}", path.display()))
            })?,
            None => ReplacementConfig::default(),
        };
        config.merge_with_cli(ReplacementConfig {
            backup_enabled: !self.no_backup,
            backup_dir: self.backup_dir.clone(),
            dry_run: self.dry_run,
            ..ReplacementConfig::default()
        });
        debug!("Replacement config: {:?}", config);
        Ok(config)
    }
}

fn split_all(values: &[String]) -> Vec<String> {
    values.iter().flat_map(|v| split_pattern_list(v)).collect()
}

fn emit<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Text => unreachable!("text output is printed by the caller"),
    }
    Ok(())
}

fn print_search_report(report: &SearchReport, stats_only: bool) {
    if !stats_only {
        for (path, matches) in &report.matches {
            println!("\n{}", path.blue());
            for m in matches {
                for line in &m.lines {
                    let number = line.line.to_string();
                    match line.kind {
                        LineKind::Match => println!("{}: {}", number.green(), line.text),
                        _ => println!("{}- {}", number.dimmed(), line.text.dimmed()),
                    }
                }
                if m.lines.len() > 1 {
                    println!("{}", "--".dimmed());
                }
            }
        }
        print_errors(&report.errors);
    }

    println!(
        "\nFound {} matches in {} files ({} scanned)",
        report.summary.total_matches,
        report.summary.files_with_matches,
        report.summary.files_scanned
    );
}

fn print_change(change: &FileReplacement) {
    if !change.written {
        println!("Dry run - no changes will be made");
    }
    print_colored_diff(&change.diff);
    if let Some(backup) = &change.backup_path {
        println!("Backup: {}", backup.display().to_string().dimmed());
    }
    println!(
        "{} {} match(es) in {}",
        if change.written { "Replaced" } else { "Would replace" },
        change.match_count,
        change.path.blue()
    );
}

fn print_replace_report(report: &ReplaceReport) {
    for change in report.changes.values() {
        print_colored_diff(&change.diff);
    }
    print_errors(&report.errors);
    let verb = if report.changes.values().any(|c| !c.written) {
        "Would replace"
    } else {
        "Replaced"
    };
    println!(
        "\n{} {} matches in {} files ({} scanned)",
        verb,
        report.summary.total_replacements,
        report.summary.files_changed,
        report.summary.files_scanned
    );
}

fn print_errors(errors: &std::collections::BTreeMap<String, scoutedit::results::FileError>) {
    for (path, err) in errors {
        eprintln!(
            "{} {}: {}",
            format!("skipped[{}]", err.kind).yellow(),
            path,
            err.message
        );
    }
}
