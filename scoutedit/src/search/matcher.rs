use regex::{Regex, RegexBuilder};

use crate::errors::{SearchError, SearchResult};
use crate::lines::{LineIndex, MatchSpan};
use crate::results::Match;

/// Compiles a search regex in which `.` also matches `\n`.
pub fn compile_search_pattern(pattern: &str) -> SearchResult<Regex> {
    if pattern.is_empty() {
        return Err(SearchError::invalid_pattern(pattern, "pattern is empty"));
    }
    RegexBuilder::new(pattern)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| SearchError::invalid_pattern(pattern, e))
}

/// Finds matches in whole-file content.
///
/// The compiled regex is immutable and shared by reference, so one matcher
/// serves every worker thread.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
}

impl PatternMatcher {
    /// Creates a matcher for a user pattern
    pub fn new(pattern: &str) -> SearchResult<Self> {
        Ok(Self {
            regex: compile_search_pattern(pattern)?,
        })
    }

    pub fn from_regex(regex: Regex) -> Self {
        Self { regex }
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Byte ranges of all non-overlapping matches, leftmost first
    pub fn find_ranges(&self, content: &str) -> Vec<(usize, usize)> {
        self.regex
            .find_iter(content)
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    /// One [`Match`] per non-overlapping match, with its line span and
    /// `before` / `after` lines of context.
    pub fn find_matches(
        &self,
        content: &str,
        context_before: usize,
        context_after: usize,
    ) -> SearchResult<Vec<Match>> {
        let index = LineIndex::new(content);
        let last_line = index.line_count().max(1);

        self.find_ranges(content)
            .into_iter()
            .map(|(start, end)| {
                let start_line = index.line_of(start).min(last_line);
                // The span ends on the line holding the last matched byte
                let end_line = if end > start {
                    index.line_of(end - 1).min(last_line)
                } else {
                    start_line
                };

                let lines = if index.line_count() == 0 {
                    Vec::new()
                } else {
                    index.context_window(start_line, end_line, context_before, context_after)?
                };

                Ok(Match {
                    span: MatchSpan::new(start_line, end_line),
                    lines,
                })
            })
            .collect()
    }
}

/// Searches `content` for `pattern`, see [`PatternMatcher::find_matches`].
pub fn search_content(
    content: &str,
    pattern: &str,
    context_before: usize,
    context_after: usize,
) -> SearchResult<Vec<Match>> {
    PatternMatcher::new(pattern)?.find_matches(content, context_before, context_after)
}
