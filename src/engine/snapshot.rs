//! Normalized terminal buffer value.

use super::rules::PromptRules;

/// Immutable, normalized view of one pane capture.
///
/// Normalization happens once, here: trailing whitespace is removed from
/// every row and blank rows are dropped. Leading indentation is kept so
/// indented reply continuation lines survive extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    lines: Vec<String>,
}

impl Snapshot {
    pub fn from_lines<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines = rows
            .into_iter()
            .filter_map(|row| {
                let trimmed = row.as_ref().trim_end();
                (!trimmed.trim_start().is_empty()).then(|| trimmed.to_string())
            })
            .collect();
        Self { lines }
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.lines())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn last_line(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// The last `count` lines (fewer when the buffer is shorter).
    pub fn tail(&self, count: usize) -> &[String] {
        let start = self.lines.len().saturating_sub(count);
        &self.lines[start..]
    }

    /// Idle test: the last non-empty line is an idle or continuation prompt.
    pub fn is_idle(&self, rules: &PromptRules) -> bool {
        self.last_line()
            .is_some_and(|line| rules.is_idle_line(line))
    }
}
