//! Tmux capture-pane helpers.

use super::process::shell_quote;

/// `tmux` invocation prefix, honoring an optional `-S` socket path.
pub(super) fn tmux_prefix(socket: Option<&str>) -> String {
    match socket.map(str::trim).filter(|s| !s.is_empty()) {
        Some(path) => format!("tmux -S {}", shell_quote(path)),
        None => "tmux".to_string(),
    }
}

/// Build the `tmux capture-pane` command for the visible pane contents.
///
/// Wrapped lines are joined (`-J`) so a long reply line is not split into
/// several rows by the pane width.
pub(super) fn build_capture_pane_command(socket: Option<&str>, target: &str) -> String {
    format!(
        "{} capture-pane -p -J -t {}",
        tmux_prefix(socket),
        shell_quote(target)
    )
}

/// Split captured output into rows, keeping only the last `max_rows`.
///
/// Trailing blank rows below the cursor are dropped before counting so the
/// row budget is spent on content. `max_rows == 0` keeps everything.
pub(super) fn last_rows(output: &str, max_rows: usize) -> Vec<String> {
    let rows: Vec<&str> = output.trim_end().lines().collect();
    let start = if max_rows > 0 && rows.len() > max_rows {
        rows.len() - max_rows
    } else {
        0
    };
    rows[start..].iter().map(|row| row.to_string()).collect()
}
