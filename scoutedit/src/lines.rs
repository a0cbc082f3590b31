//! Line arithmetic over in-memory file content.
//!
//! Line numbers are 1-based throughout. A trailing newline does not start an
//! extra line, so `"a\nb\n"` has two lines. Editing helpers work on byte
//! ranges of the original content and leave every untouched byte as it was,
//! including `\r\n` line endings.
use serde::Serialize;

use crate::errors::{SearchError, SearchResult};

/// Inclusive, 1-based line range covered by a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "(usize, usize)")]
pub struct MatchSpan {
    pub start_line: usize,
    pub end_line: usize,
}

impl MatchSpan {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }
}

impl From<MatchSpan> for (usize, usize) {
    fn from(span: MatchSpan) -> Self {
        (span.start_line, span.end_line)
    }
}

/// Position of a context line relative to the match it surrounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Before,
    Match,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextLine {
    pub line: usize,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: LineKind,
}

pub type ContextBlock = Vec<ContextLine>;

/// Precomputed line boundaries for one piece of content.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    content: &'a str,
    lines: Vec<&'a str>,
    /// Byte offset at which each line starts; one entry per `\n` plus the first
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(content: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            content,
            lines: content.lines().collect(),
            line_starts,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Text of a 1-based line without its terminator
    pub fn line(&self, number: usize) -> Option<&'a str> {
        number.checked_sub(1).and_then(|i| self.lines.get(i).copied())
    }

    /// 1-based line containing `offset`: newlines strictly before it, plus one.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// Byte range of lines `start..=end`, including the final line's newline.
    pub fn byte_range(&self, start: usize, end: usize) -> SearchResult<(usize, usize)> {
        self.check_range(start, end)?;
        let from = self.line_starts[start - 1];
        let to = self
            .line_starts
            .get(end)
            .copied()
            .unwrap_or(self.content.len());
        Ok((from, to))
    }

    /// Lines `[start - before, end + after]` clamped to the content, each
    /// labelled relative to `[start, end]`.
    pub fn context_window(
        &self,
        start: usize,
        end: usize,
        before: usize,
        after: usize,
    ) -> SearchResult<ContextBlock> {
        self.check_range(start, end)?;

        let from = start.saturating_sub(before).max(1);
        let to = end.saturating_add(after).min(self.line_count());

        Ok((from..=to)
            .map(|number| ContextLine {
                line: number,
                text: self.lines[number - 1].to_string(),
                kind: if number < start {
                    LineKind::Before
                } else if number > end {
                    LineKind::After
                } else {
                    LineKind::Match
                },
            })
            .collect())
    }

    fn check_range(&self, start: usize, end: usize) -> SearchResult<()> {
        let total = self.line_count();
        if start == 0 || end < start || end > total {
            return Err(SearchError::invalid_line_range(start, end, total));
        }
        Ok(())
    }
}

/// 1-based line number of a byte offset.
pub fn offset_to_line(content: &str, offset: usize) -> usize {
    let end = offset.min(content.len());
    content.as_bytes()[..end]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Context block around lines `start..=end`, see [`LineIndex::context_window`].
pub fn context_window(
    content: &str,
    start: usize,
    end: usize,
    before: usize,
    after: usize,
) -> SearchResult<ContextBlock> {
    LineIndex::new(content).context_window(start, end, before, after)
}

/// Returns lines `start..=end` joined with `\n`.
pub fn extract_lines(content: &str, start: usize, end: usize) -> SearchResult<String> {
    let index = LineIndex::new(content);
    index.check_range(start, end)?;
    Ok(index.lines[start - 1..end].join("\n"))
}

/// Replaces lines `start..=end` with `text`.
pub fn replace_lines(content: &str, start: usize, end: usize, text: &str) -> SearchResult<String> {
    let index = LineIndex::new(content);
    let (from, to) = index.byte_range(start, end)?;

    let mut replacement = text.to_string();
    let removed_newline = content[from..to].ends_with('\n');
    if removed_newline && !replacement.is_empty() && !replacement.ends_with('\n') {
        replacement.push('\n');
    }

    let mut updated = String::with_capacity(content.len() + replacement.len());
    updated.push_str(&content[..from]);
    updated.push_str(&replacement);
    updated.push_str(&content[to..]);
    Ok(updated)
}

/// Deletes lines `start..=end`.
pub fn delete_lines(content: &str, start: usize, end: usize) -> SearchResult<String> {
    replace_lines(content, start, end, "")
}

/// Inserts `text` so that it begins at line `line`; `line_count + 1` appends.
pub fn insert_at_line(content: &str, line: usize, text: &str) -> SearchResult<String> {
    let index = LineIndex::new(content);
    let total = index.line_count();
    if line == 0 || line > total + 1 {
        return Err(SearchError::invalid_line_range(line, line, total));
    }

    let mut updated = String::with_capacity(content.len() + text.len() + 1);
    if line <= total {
        let at = index.line_starts[line - 1];
        updated.push_str(&content[..at]);
        updated.push_str(text);
        if !text.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&content[at..]);
    } else {
        updated.push_str(content);
        if !content.is_empty() && !content.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(text);
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_lines() -> String {
        (1..=10).map(|i| format!("line {i}\n")).collect()
    }

    #[test]
    fn test_offset_to_line() {
        let content = "one\ntwo\nthree";
        assert_eq!(offset_to_line(content, 0), 1);
        assert_eq!(offset_to_line(content, 3), 1); // the newline itself
        assert_eq!(offset_to_line(content, 4), 2);
        assert_eq!(offset_to_line(content, 8), 3);
        assert_eq!(offset_to_line(content, 1000), 3);

        let index = LineIndex::new(content);
        for offset in 0..content.len() {
            assert_eq!(index.line_of(offset), offset_to_line(content, offset));
        }
    }

    #[test]
    fn test_context_window_labels() {
        let content = ten_lines();
        let block = context_window(&content, 5, 5, 2, 2).unwrap();
        let numbers: Vec<_> = block.iter().map(|l| l.line).collect();
        let kinds: Vec<_> = block.iter().map(|l| l.kind).collect();
        assert_eq!(numbers, vec![3, 4, 5, 6, 7]);
        assert_eq!(
            kinds,
            vec![
                LineKind::Before,
                LineKind::Before,
                LineKind::Match,
                LineKind::After,
                LineKind::After
            ]
        );
        assert_eq!(block[2].text, "line 5");
    }

    #[test]
    fn test_context_window_clamps_to_bounds() {
        let content = ten_lines();
        let block = context_window(&content, 1, 2, 5, 0).unwrap();
        assert_eq!(block.first().map(|l| l.line), Some(1));
        assert_eq!(block.len(), 2);

        let block = context_window(&content, 9, 10, 1, 5).unwrap();
        assert_eq!(block.first().map(|l| l.line), Some(8));
        assert_eq!(block.last().map(|l| l.line), Some(10));
        assert!(block.iter().skip(1).all(|l| l.kind == LineKind::Match));
    }

    #[test]
    fn test_invalid_ranges() {
        let content = ten_lines();
        assert!(matches!(
            context_window(&content, 0, 1, 0, 0),
            Err(SearchError::InvalidLineRange { .. })
        ));
        assert!(matches!(
            extract_lines(&content, 4, 3),
            Err(SearchError::InvalidLineRange { .. })
        ));
        assert!(matches!(
            extract_lines(&content, 10, 11),
            Err(SearchError::InvalidLineRange { total: 10, .. })
        ));
    }

    #[test]
    fn test_extract_lines() {
        let content = ten_lines();
        assert_eq!(extract_lines(&content, 2, 3).unwrap(), "line 2\nline 3");
    }

    #[test]
    fn test_replace_and_delete_lines() {
        let content = "a\nb\nc\n";
        assert_eq!(replace_lines(content, 2, 2, "B").unwrap(), "a\nB\nc\n");
        assert_eq!(replace_lines(content, 1, 2, "x\ny\nz\n").unwrap(), "x\ny\nz\nc\n");
        assert_eq!(delete_lines(content, 2, 3).unwrap(), "a\n");

        // Last line without a trailing newline keeps that shape
        assert_eq!(replace_lines("a\nb", 2, 2, "B").unwrap(), "a\nB");
    }

    #[test]
    fn test_insert_at_line() {
        let content = "a\nb\n";
        assert_eq!(insert_at_line(content, 1, "top").unwrap(), "top\na\nb\n");
        assert_eq!(insert_at_line(content, 2, "mid\n").unwrap(), "a\nmid\nb\n");
        assert_eq!(insert_at_line(content, 3, "end\n").unwrap(), "a\nb\nend\n");
        assert_eq!(insert_at_line("a", 2, "b").unwrap(), "a\nb");
        assert!(insert_at_line(content, 5, "x").is_err());
    }

    #[test]
    fn test_span_serializes_as_pair() {
        let json = serde_json::to_string(&MatchSpan::new(3, 4)).unwrap();
        assert_eq!(json, "[3,4]");

        let line = ContextLine {
            line: 1,
            text: "x".to_string(),
            kind: LineKind::Match,
        };
        assert_eq!(
            serde_json::to_string(&line).unwrap(),
            r#"{"line":1,"text":"x","type":"match"}"#
        );
    }
}
