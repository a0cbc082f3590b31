use std::path::Path;
use tracing::trace;

use super::matcher::PatternMatcher;
use crate::config::EncodingMode;
use crate::errors::SearchResult;
use crate::results::FileResult;
use crate::storage::read_text;

/// Handles file processing operations
#[derive(Debug, Clone)]
pub struct FileProcessor {
    matcher: PatternMatcher,
    context_before: usize,
    context_after: usize,
    encoding_mode: EncodingMode,
}

impl FileProcessor {
    /// Creates a new FileProcessor with the given pattern matcher
    pub fn new(
        matcher: PatternMatcher,
        context_before: usize,
        context_after: usize,
        encoding_mode: EncodingMode,
    ) -> Self {
        Self {
            matcher,
            context_before,
            context_after,
            encoding_mode,
        }
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// Reads the file at `path` and returns its matches under the name `relative`
    pub fn process_file(&self, path: &Path, relative: &str) -> SearchResult<FileResult> {
        trace!("Processing file: {}", path.display());

        let contents = read_text(path, self.encoding_mode)?;
        let matches =
            self.matcher
                .find_matches(&contents, self.context_before, self.context_after)?;

        Ok(FileResult {
            path: relative.to_string(),
            matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SearchError;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_large_file_matching() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("large_test.txt");
        let mut file = File::create(&file_path).unwrap();

        // Large enough to leave the in-memory read path
        let line = "This is a test line with pattern_123 and another pattern_456\n";
        for _ in 0..1000 {
            file.write_all(line.as_bytes()).unwrap();
        }

        let matcher = PatternMatcher::new(r"pattern_\d+").unwrap();
        let processor = FileProcessor::new(matcher, 0, 0, EncodingMode::FailFast);

        let result = processor.process_file(&file_path, "large_test.txt").unwrap();
        assert_eq!(result.path, "large_test.txt");
        assert_eq!(result.matches.len(), 2000);

        let mut prev_line = 0;
        for m in &result.matches {
            assert!(m.span.start_line >= prev_line);
            assert!(m.lines[0].text.contains("pattern_"));
            prev_line = m.span.start_line;
        }
        assert_eq!(result.matches.last().map(|m| m.span.start_line), Some(1000));
    }

    #[test]
    fn test_encoding_modes() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("mixed.txt");
        std::fs::write(&file_path, [b'n', b'e', b'e', b'd', b'l', b'e', 0xff, b'\n']).unwrap();

        let lossy = FileProcessor::new(
            PatternMatcher::new("needle").unwrap(),
            0,
            0,
            EncodingMode::Lossy,
        );
        assert_eq!(lossy.process_file(&file_path, "mixed.txt").unwrap().matches.len(), 1);

        let strict = FileProcessor::new(
            PatternMatcher::new("needle").unwrap(),
            0,
            0,
            EncodingMode::FailFast,
        );
        assert!(matches!(
            strict.process_file(&file_path, "mixed.txt"),
            Err(SearchError::EncodingError { .. })
        ));
    }
}
