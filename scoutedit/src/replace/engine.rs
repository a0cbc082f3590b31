use regex::{Captures, NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::backref::{expand_backrefs, has_backrefs};
use crate::errors::{SearchError, SearchResult};
use crate::lines::offset_to_line;

/// How the needle of a replacement is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplaceMode {
    /// Raw substring; the replacement is inserted verbatim
    #[default]
    Literal,
    /// Regular expression; `$!N` in the replacement expands per match
    Regex,
}

impl fmt::Display for ReplaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceMode::Literal => write!(f, "literal"),
            ReplaceMode::Regex => write!(f, "regex"),
        }
    }
}

/// Outcome of a successful replacement; `match_count` is at least 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementResult {
    pub updated_content: String,
    pub match_count: usize,
    pub first_match_line: Option<usize>,
}

/// Compiles a replacement regex: `.` matches `\n` and `^`/`$` match at line
/// boundaries.
pub fn compile_replace_pattern(needle: &str) -> SearchResult<Regex> {
    RegexBuilder::new(needle)
        .dot_matches_new_line(true)
        .multi_line(true)
        .build()
        .map_err(|e| SearchError::invalid_pattern(needle, e))
}

#[derive(Debug, Clone)]
enum Needle {
    Literal(String),
    Regex(Regex),
}

/// A compiled needle plus replacement, applied to any number of contents.
#[derive(Debug, Clone)]
pub struct Replacer {
    source: String,
    needle: Needle,
    replacement: String,
    allow_multiple: bool,
}

impl Replacer {
    pub fn new(
        needle: &str,
        replacement: &str,
        mode: ReplaceMode,
        allow_multiple: bool,
    ) -> SearchResult<Self> {
        if needle.is_empty() {
            return Err(SearchError::invalid_pattern(needle, "needle is empty"));
        }
        let compiled = match mode {
            ReplaceMode::Literal => Needle::Literal(needle.to_string()),
            ReplaceMode::Regex => Needle::Regex(compile_replace_pattern(needle)?),
        };
        Ok(Self {
            source: needle.to_string(),
            needle: compiled,
            replacement: replacement.to_string(),
            allow_multiple,
        })
    }

    /// The needle as the caller wrote it
    pub fn needle(&self) -> &str {
        &self.source
    }

    pub fn mode(&self) -> ReplaceMode {
        match self.needle {
            Needle::Literal(_) => ReplaceMode::Literal,
            Needle::Regex(_) => ReplaceMode::Regex,
        }
    }

    /// Replaces the needle in `content`.
    ///
    /// Fails with `PatternNotFound` when there is nothing to replace and with
    /// `AmbiguousMatch` when there is more than one match and multiple
    /// replacements were not allowed. In regex mode a multi-line match that
    /// still matches after dropping its first character fails with
    /// `AmbiguousOverlap`.
    pub fn apply(&self, content: &str) -> SearchResult<ReplacementResult> {
        match &self.needle {
            Needle::Literal(needle) => self.apply_literal(content, needle),
            Needle::Regex(regex) => self.apply_regex(content, regex),
        }
    }

    fn check_count(&self, count: usize) -> SearchResult<()> {
        if count == 0 {
            return Err(SearchError::pattern_not_found(&self.source));
        }
        if count > 1 && !self.allow_multiple {
            return Err(SearchError::ambiguous_match(&self.source, count));
        }
        Ok(())
    }

    fn apply_literal(&self, content: &str, needle: &str) -> SearchResult<ReplacementResult> {
        let mut occurrences = content.match_indices(needle);
        let first = occurrences.next().map(|(offset, _)| offset);
        let count = first.map_or(0, |_| 1 + occurrences.count());
        self.check_count(count)?;

        Ok(ReplacementResult {
            updated_content: content.replace(needle, &self.replacement),
            match_count: count,
            first_match_line: first.map(|offset| offset_to_line(content, offset)),
        })
    }

    fn apply_regex(&self, content: &str, regex: &Regex) -> SearchResult<ReplacementResult> {
        let found: Vec<_> = regex.find_iter(content).collect();
        self.check_count(found.len())?;

        for m in &found {
            let text = m.as_str();
            if !text.contains('\n') {
                continue;
            }
            let rest = text
                .char_indices()
                .nth(1)
                .map_or("", |(offset, _)| &text[offset..]);
            if regex.is_match(rest) {
                return Err(SearchError::ambiguous_overlap(
                    &self.source,
                    offset_to_line(content, m.start()),
                ));
            }
        }

        let updated = if has_backrefs(&self.replacement) {
            regex.replace_all(content, |caps: &Captures<'_>| {
                expand_backrefs(&self.replacement, caps)
            })
        } else {
            regex.replace_all(content, NoExpand(&self.replacement))
        };

        Ok(ReplacementResult {
            updated_content: updated.into_owned(),
            match_count: found.len(),
            first_match_line: found.first().map(|m| offset_to_line(content, m.start())),
        })
    }
}

/// Replaces `needle` in `content`, see [`Replacer::apply`].
pub fn replace_content(
    content: &str,
    needle: &str,
    replacement: &str,
    mode: ReplaceMode,
    allow_multiple: bool,
) -> SearchResult<ReplacementResult> {
    Replacer::new(needle, replacement, mode, allow_multiple)?.apply(content)
}
