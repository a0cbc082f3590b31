use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use super::matcher::PatternMatcher;
use super::processor::FileProcessor;
use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};
use crate::results::SearchReport;
use crate::walk::FileEnumerator;

/// Builds the worker pool a multi-file operation runs on
pub(crate) fn build_pool(thread_count: usize) -> SearchResult<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .map_err(|e| SearchError::config_error(format!("Failed to build thread pool: {e}")))
}

/// Work units handed to each rayon task
pub(crate) fn chunk_size(files: usize, threads: usize) -> usize {
    (files / threads.max(1)).clamp(16, 256)
}

/// Performs a concurrent search across the files selected by `config`.
///
/// Files are searched independently; unreadable files become soft errors in
/// the report and do not stop the scan.
pub fn search(config: &SearchConfig) -> SearchResult<SearchReport> {
    info!("Starting search with pattern: {:?}", config.pattern);

    let matcher = PatternMatcher::new(&config.pattern)?;
    let processor = FileProcessor::new(
        matcher,
        config.context_before,
        config.context_after,
        config.encoding_mode,
    );

    let enumerator = FileEnumerator::from_config(config)?;
    let files = enumerator.enumerate(&config.relative_path)?;
    let root = enumerator.root();
    debug!("Found {} files to process", files.len());

    let thread_count = config.thread_count.get();
    let pool = build_pool(thread_count)?;
    let chunk = chunk_size(files.len(), thread_count);

    let outcomes: Vec<_> = pool.install(|| {
        files
            .par_chunks(chunk)
            .flat_map_iter(|paths| {
                paths.iter().map(|rel| {
                    let outcome = processor.process_file(&root.path().join(rel), rel);
                    (rel, outcome)
                })
            })
            .collect()
    });

    let mut report = SearchReport::new();
    for (rel, outcome) in outcomes {
        match outcome {
            Ok(file_result) => report.add_file_result(file_result),
            Err(err) => {
                warn!("Skipping {}: {}", rel, err);
                report.add_file_error(rel.as_str(), &err);
            }
        }
    }

    info!(
        "Search complete. Found {} matches in {} files",
        report.summary.total_matches, report.summary.files_with_matches
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingMode;
    use std::num::NonZeroUsize;
    use tempfile::tempdir;

    #[test]
    fn test_search_summary() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("test.txt"), "test line\ntest line 2\n").unwrap();
        std::fs::write(dir.path().join("other.txt"), "nothing here\n").unwrap();

        let config = SearchConfig {
            thread_count: NonZeroUsize::new(1).unwrap(),
            ..SearchConfig::new("test", dir.path())
        };

        let report = search(&config).unwrap();
        assert_eq!(report.summary.files_scanned, 2);
        assert_eq!(report.summary.files_with_matches, 1);
        assert_eq!(report.summary.total_matches, 2);
        assert!(report.matches.contains_key("test.txt"));
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_unreadable_file_is_a_soft_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), "needle\n").unwrap();
        std::fs::write(dir.path().join("bad.bin"), [0xff, 0xfe, b'n']).unwrap();

        let config = SearchConfig {
            encoding_mode: EncodingMode::FailFast,
            ..SearchConfig::new("needle", dir.path())
        };

        let report = search(&config).unwrap();
        assert_eq!(report.summary.files_scanned, 2);
        assert_eq!(report.summary.files_with_matches, 1);
        assert_eq!(report.errors["bad.bin"].kind, "EncodingError");
    }

    #[test]
    fn test_invalid_pattern_fails_early() {
        let dir = tempdir().unwrap();
        let config = SearchConfig::new("(", dir.path());
        assert!(matches!(
            search(&config),
            Err(SearchError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_chunk_size_bounds() {
        assert_eq!(chunk_size(0, 4), 16);
        assert_eq!(chunk_size(100_000, 4), 256);
        assert_eq!(chunk_size(400, 4), 100);
    }
}
