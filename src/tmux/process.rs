//! Process and shell execution helpers shared by tmux operations.

use crate::error::TerminalError;
use std::process::Stdio;
use tokio::process::Command;

/// Captured output of one finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ExecOutput {
    pub(super) exit_code: i32,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

/// Run a local shell command through `sh -c`.
pub(super) async fn run_sh_process(command: &str) -> Result<ExecOutput, TerminalError> {
    run_process("sh", &["-c".into(), command.into()]).await
}

/// Spawn and wait for a process.
pub(super) async fn run_process(program: &str, args: &[String]) -> Result<ExecOutput, TerminalError> {
    let mut cmd = Command::new(program);
    // Capture timeouts drop the owning future; the child must die with it.
    cmd.kill_on_drop(true);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = cmd
        .output()
        .await
        .map_err(|e| TerminalError::ExecutionFailed(format!("{program}: {e}")))?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Convert non-zero command status into contextual errors.
pub(super) fn ensure_success(output: ExecOutput, context: &str) -> Result<ExecOutput, TerminalError> {
    if output.exit_code == 0 {
        return Ok(output);
    }

    let mut details = if output.stderr.trim().is_empty() {
        output.stdout.trim().to_string()
    } else {
        output.stderr.trim().to_string()
    };
    if details.is_empty() {
        details = format!("command exited with {}", output.exit_code);
    }

    Err(TerminalError::ExecutionFailed(format!("{context}: {details}")))
}

/// Shell-safe single-quote escaping.
pub(super) fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        "''".into()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}
