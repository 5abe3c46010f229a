//! Tmux key injection helpers.

use super::capture::tmux_prefix;
use super::process::shell_quote;

/// Map symbolic key names used by chat front ends to tmux key names.
///
/// Anything unrecognized (including plain characters such as `t`) is passed
/// through unchanged.
pub(super) fn tmux_key_name(key: &str) -> &str {
    match key {
        "ENTER" => "Enter",
        "LEFT" => "Left",
        "RIGHT" => "Right",
        "UP" => "Up",
        "DOWN" => "Down",
        "CTRL+C" | "CMD+C" => "C-c",
        other => other,
    }
}

/// Build tmux send-keys command for a single key.
pub(super) fn build_send_key_command(socket: Option<&str>, target: &str, key: &str) -> String {
    format!(
        "{} send-keys -t {} {}",
        tmux_prefix(socket),
        shell_quote(target),
        shell_quote(tmux_key_name(key))
    )
}
