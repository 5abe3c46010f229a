//! Terminal multiplexer boundary: pane snapshots and key injection.
//!
//! The engine only talks to the [`Terminal`] trait so tests can script
//! screens without a tmux server. [`TmuxClient`] is the production backend.

mod capture;
mod process;
mod send_keys;

use crate::error::TerminalError;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

/// Opaque tmux target (`session:window.pane`, `%id`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct PaneTarget(String);

impl PaneTarget {
    pub fn new(target: impl Into<String>) -> Self {
        Self(target.into())
    }

    /// Conventional target for a registered bot: `{session}:{window}.{pane}`.
    pub fn format_win_id(session: &str, window: &str, pane: u32) -> Self {
        Self(format!("{session}:{window}.{pane}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaneTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot source plus keystroke sink for one multiplexer.
#[async_trait]
pub trait Terminal: Send + Sync {
    /// Visible pane rows, oldest first, truncated to the last `max_rows`.
    async fn capture(&self, target: &PaneTarget, max_rows: usize)
        -> Result<Vec<String>, TerminalError>;

    /// Inject one key (symbolic name or literal character) into the pane.
    async fn send_keys(&self, target: &PaneTarget, key: &str) -> Result<(), TerminalError>;
}

/// Local tmux backend driven through `sh -c tmux ...`.
#[derive(Debug, Clone, Default)]
pub struct TmuxClient {
    socket: Option<String>,
}

impl TmuxClient {
    /// Client for the default server, or the server at `socket` (`tmux -S`).
    pub fn new(socket: Option<String>) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl Terminal for TmuxClient {
    async fn capture(
        &self,
        target: &PaneTarget,
        max_rows: usize,
    ) -> Result<Vec<String>, TerminalError> {
        let cmd = capture::build_capture_pane_command(self.socket.as_deref(), target.as_str());
        let output = process::run_sh_process(&cmd).await?;
        let out = process::ensure_success(output, "failed to capture tmux pane")?;
        Ok(capture::last_rows(&out.stdout, max_rows))
    }

    async fn send_keys(&self, target: &PaneTarget, key: &str) -> Result<(), TerminalError> {
        let cmd = send_keys::build_send_key_command(self.socket.as_deref(), target.as_str(), key);
        let output = process::run_sh_process(&cmd).await?;
        process::ensure_success(output, "failed to send keys to tmux pane")?;
        Ok(())
    }
}
