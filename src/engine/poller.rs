//! Concurrent pane capture for one tick.

use super::snapshot::Snapshot;
use crate::error::TerminalError;
use crate::registry::Session;
use crate::tmux::Terminal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;

/// Captures every session's pane in parallel, bounded by a worker cap.
pub struct SnapshotPoller {
    terminal: Arc<dyn Terminal>,
    max_rows: usize,
    capture_timeout: Duration,
    min_workers: usize,
    max_workers: usize,
}

impl SnapshotPoller {
    pub fn new(
        terminal: Arc<dyn Terminal>,
        max_rows: usize,
        capture_timeout: Duration,
        min_workers: usize,
        max_workers: usize,
    ) -> Self {
        Self {
            terminal,
            max_rows,
            capture_timeout,
            min_workers: min_workers.max(1),
            max_workers: max_workers.max(1),
        }
    }

    /// Concurrency for `sessions` captures: at least `min_workers`, at most
    /// `max_workers`.
    pub fn worker_count(&self, sessions: usize) -> usize {
        sessions.max(self.min_workers).min(self.max_workers.max(self.min_workers))
    }

    /// Capture all sessions. Results come back in input order; one failing
    /// capture never affects the others.
    pub async fn capture_all(
        &self,
        sessions: &[Session],
    ) -> Vec<(Session, Result<Snapshot, TerminalError>)> {
        let permits = Arc::new(Semaphore::new(self.worker_count(sessions.len())));
        let mut handles = Vec::with_capacity(sessions.len());
        for session in sessions {
            let terminal = Arc::clone(&self.terminal);
            let permits = Arc::clone(&permits);
            let target = session.target.clone();
            let max_rows = self.max_rows;
            let limit = self.capture_timeout;
            handles.push(tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| TerminalError::ExecutionFailed(e.to_string()))?;
                match timeout(limit, terminal.capture(&target, max_rows)).await {
                    Ok(rows) => rows.map(Snapshot::from_lines),
                    Err(_) => Err(TerminalError::Timeout(limit)),
                }
            }));
        }

        let mut results = Vec::with_capacity(sessions.len());
        for (session, handle) in sessions.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(TerminalError::ExecutionFailed(format!(
                    "capture task failed: {join_err}"
                ))),
            };
            results.push((session.clone(), result));
        }
        results
    }
}
