//! Auto-authorization of interactive decision prompts.

use super::rules::PromptRules;
use super::snapshot::Snapshot;
use crate::tmux::{PaneTarget, Terminal};
use crate::textutil::log_excerpt;

/// Policy for answering yes/no/trust prompts seen in busy panes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizePolicy {
    pub enabled: bool,
    /// Trailing lines of the buffer searched for a decision marker.
    pub context_lines: usize,
    /// Key sent when a marker is found (`t` = trust).
    pub response_key: String,
}

impl Default for AuthorizePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            context_lines: 3,
            response_key: "t".to_string(),
        }
    }
}

/// Pending keystroke for one session, produced during tick processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub session: String,
    pub target: PaneTarget,
    pub key: String,
    /// Trailing lines that triggered the decision, joined for audit logs.
    pub context: String,
}

impl AuthorizePolicy {
    /// Inspect a busy buffer; one authorization at most per call.
    pub fn inspect(
        &self,
        session: &str,
        target: &PaneTarget,
        buffer: &Snapshot,
        rules: &PromptRules,
    ) -> Option<Authorization> {
        if !self.enabled {
            return None;
        }
        let tail = buffer.tail(self.context_lines);
        if !tail.iter().any(|line| rules.is_decision_line(line)) {
            return None;
        }
        Some(Authorization {
            session: session.to_string(),
            target: target.clone(),
            key: self.response_key.clone(),
            context: tail.join("\n"),
        })
    }
}

/// Send the keystroke. Failures are logged and not retried; the prompt is
/// picked up again the next time the pane changes while still pending.
pub async fn apply(terminal: &dyn Terminal, auth: &Authorization) -> bool {
    match terminal.send_keys(&auth.target, &auth.key).await {
        Ok(()) => {
            tracing::info!(
                session = %auth.session,
                key = %auth.key,
                context = %log_excerpt(&auth.context, 120),
                "auto-authorized decision prompt"
            );
            true
        }
        Err(err) => {
            tracing::warn!(
                session = %auth.session,
                error = %err,
                "failed to send authorization key"
            );
            false
        }
    }
}
