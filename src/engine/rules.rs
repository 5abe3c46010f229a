//! Prompt conventions of the relayed assistant, expressed as data.
//!
//! Every screen-reading decision (idle test, chrome filtering, reply block
//! boundaries, decision prompts) consults a [`PromptRules`] value, so another
//! assistant's conventions can be swapped in from config without touching
//! the extractor or the state machine.

use serde::Deserialize;

/// One line pattern. Matching is done against the fully trimmed line.
///
/// In TOML: `{ prefix = "λ >" }` or `{ contains = "(using tool:" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMatcher {
    Prefix(String),
    Contains(String),
}

impl LineMatcher {
    pub fn prefix(text: &str) -> Self {
        Self::Prefix(text.to_string())
    }

    pub fn contains(text: &str) -> Self {
        Self::Contains(text.to_string())
    }

    pub fn matches(&self, line: &str) -> bool {
        let line = line.trim();
        match self {
            Self::Prefix(prefix) => line.starts_with(prefix.as_str()),
            Self::Contains(needle) => line.contains(needle.as_str()),
        }
    }
}

fn any_match(matchers: &[LineMatcher], line: &str) -> bool {
    matchers.iter().any(|matcher| matcher.matches(line))
}

/// Screen conventions for one assistant CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptRules {
    /// Last-line patterns meaning "waiting for input".
    pub idle: Vec<LineMatcher>,
    /// Lines that can never start a reply block.
    pub chrome: Vec<LineMatcher>,
    /// Lines that end a reply block when collecting.
    pub stop: Vec<LineMatcher>,
    /// Prefix the assistant puts on the first line of a reply.
    pub reply_marker: String,
    /// Persona labels that also open a reply block; kept in the output.
    pub reply_labels: Vec<String>,
    /// Inline markers of an interactive yes/no/trust decision.
    pub decision: Vec<LineMatcher>,
}

impl Default for PromptRules {
    fn default() -> Self {
        Self {
            idle: vec![
                LineMatcher::prefix("λ >"),
                LineMatcher::prefix("> What would you like to do next"),
            ],
            chrome: vec![
                LineMatcher::prefix("> What would you like to do next"),
                LineMatcher::prefix("I will run the following command:"),
                LineMatcher::prefix("Purpose:"),
                LineMatcher::contains("(using tool:"),
                LineMatcher::prefix("- Completed in"),
                LineMatcher::prefix("▸ Credits:"),
                LineMatcher::contains("Allow this action?"),
                LineMatcher::contains("[y/n/t]"),
                LineMatcher::contains("Tool use was cancelled"),
                LineMatcher::contains("Tool ran without output"),
                LineMatcher::contains("Thinking..."),
            ],
            stop: vec![
                LineMatcher::prefix("▸ Credits:"),
                LineMatcher::prefix("I will run the following command:"),
                LineMatcher::prefix("Purpose:"),
                LineMatcher::contains("(using tool:"),
            ],
            reply_marker: "> ".to_string(),
            reply_labels: vec!["[小K]".to_string(), "[Kimi]".to_string()],
            decision: vec![LineMatcher::contains("[y/n/t]")],
        }
    }
}

impl PromptRules {
    /// Whether `line` is the idle prompt or the continuation prompt.
    pub fn is_idle_line(&self, line: &str) -> bool {
        any_match(&self.idle, line)
    }

    /// Idle sentinels count as chrome even when not listed explicitly.
    pub fn is_chrome(&self, line: &str) -> bool {
        self.is_idle_line(line) || any_match(&self.chrome, line)
    }

    /// Whether collection of a reply block must end before `line`.
    pub fn is_stop(&self, line: &str) -> bool {
        self.is_idle_line(line) || any_match(&self.stop, line)
    }

    /// Whether `line` starts with the full reply marker (`> `).
    ///
    /// A bare `>` row is not a block start; inside a block it is kept as an
    /// ordinary continuation row.
    pub fn is_marker_line(&self, line: &str) -> bool {
        !self.reply_marker.trim().is_empty()
            && line.trim().starts_with(self.reply_marker.as_str())
    }

    pub fn is_label_line(&self, line: &str) -> bool {
        let line = line.trim();
        self.reply_labels
            .iter()
            .any(|label| !label.is_empty() && line.starts_with(label.as_str()))
    }

    /// Remove the reply marker from a marker line.
    pub fn strip_marker<'a>(&self, line: &'a str) -> &'a str {
        let line = line.trim();
        line.strip_prefix(self.reply_marker.as_str())
            .or_else(|| line.strip_prefix(self.reply_marker.trim_end()))
            .unwrap_or(line)
    }

    pub fn is_decision_line(&self, line: &str) -> bool {
        any_match(&self.decision, line)
    }
}
