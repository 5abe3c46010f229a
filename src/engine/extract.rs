//! Reply extraction from a finished busy period.

use super::rules::PromptRules;
use super::snapshot::Snapshot;

/// Isolate the final reply block printed during a busy period.
///
/// Only `exit` (the idle buffer that closed the period) is parsed; `entry`
/// is the buffer captured when the period began and does not need to be a
/// prefix of `exit`, since the pane may have scrolled or been cleared in
/// between. Returns an empty string when the period printed no reply, e.g.
/// pure tool execution.
pub fn extract_reply(entry: &Snapshot, exit: &Snapshot, rules: &PromptRules) -> String {
    if exit.len() < entry.len() {
        tracing::trace!(
            entry_lines = entry.len(),
            exit_lines = exit.len(),
            "pane shrank during busy period"
        );
    }

    if exit.is_empty() {
        return String::new();
    }
    let lines = exit.lines();
    let Some(start) = find_reply_start(lines, rules) else {
        return String::new();
    };

    let mut reply: Vec<&str> = Vec::new();
    for (offset, line) in lines[start..].iter().enumerate() {
        // The start line itself is a reply line even if it would stop.
        if offset > 0 && rules.is_stop(line) {
            break;
        }
        if rules.is_marker_line(line) {
            reply.push(rules.strip_marker(line));
        } else if rules.is_label_line(line) {
            reply.push(line.trim());
        } else {
            reply.push(line.trim_end());
        }
    }

    while reply.first().is_some_and(|line| line.trim().is_empty()) {
        reply.remove(0);
    }
    while reply.last().is_some_and(|line| line.trim().is_empty()) {
        reply.pop();
    }
    reply.join("\n").trim_end().to_string()
}

/// Most recent line that opens a reply block and is not chrome.
fn find_reply_start(lines: &[String], rules: &PromptRules) -> Option<usize> {
    lines.iter().rposition(|line| {
        !rules.is_chrome(line) && (rules.is_marker_line(line) || rules.is_label_line(line))
    })
}
