//! Per-session Idle/Busy tracking.
//!
//! All transition logic lives in [`SessionState::observe`], a pure function
//! of the previous state and the new snapshot. The engine owns one state per
//! session in a plain map, so nothing here needs locking.

use super::dedup::DedupLedger;
use super::rules::PromptRules;
use super::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Busy,
}

/// Result of feeding one snapshot into a session's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Same content as the previous snapshot; nothing happened.
    Unchanged,
    /// Content changed while idle and the pane is still idle.
    Settled,
    /// Content changed and the assistant is working. `entered` is true on
    /// the Idle→Busy edge.
    Busy { entered: bool },
    /// Busy→Idle: the busy period is closed and ready for extraction.
    ///
    /// `entry` is moved out of the state, so it cannot be read again after
    /// this extraction window.
    Finished { entry: Snapshot, exit: Snapshot },
}

#[derive(Debug, Clone)]
pub struct SessionState {
    last_buffer: Snapshot,
    busy_start_buffer: Option<Snapshot>,
    phase: Phase,
    seen: DedupLedger,
}

impl SessionState {
    /// Seed state from a session's first snapshot.
    ///
    /// A pane that is already busy uses that first snapshot as the start of
    /// its busy period.
    pub fn new(first: Snapshot, rules: &PromptRules, seen: DedupLedger) -> Self {
        let phase = if first.is_idle(rules) {
            Phase::Idle
        } else {
            Phase::Busy
        };
        let busy_start_buffer = (phase == Phase::Busy).then(|| first.clone());
        Self {
            last_buffer: first,
            busy_start_buffer,
            phase,
            seen,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Busy
    }

    pub fn last_buffer(&self) -> &Snapshot {
        &self.last_buffer
    }

    pub fn busy_start_buffer(&self) -> Option<&Snapshot> {
        self.busy_start_buffer.as_ref()
    }

    pub fn seen_mut(&mut self) -> &mut DedupLedger {
        &mut self.seen
    }

    /// Apply one snapshot and report what it meant.
    pub fn observe(&mut self, current: Snapshot, rules: &PromptRules) -> Observation {
        if current == self.last_buffer {
            return Observation::Unchanged;
        }

        let idle = current.is_idle(rules);
        let observation = match (self.phase, idle) {
            (Phase::Idle, true) => Observation::Settled,
            (Phase::Idle, false) => {
                // Busy period starts from the screen as it was before the change.
                self.busy_start_buffer = Some(self.last_buffer.clone());
                self.phase = Phase::Busy;
                Observation::Busy { entered: true }
            }
            (Phase::Busy, false) => Observation::Busy { entered: false },
            (Phase::Busy, true) => {
                self.phase = Phase::Idle;
                let entry = self.busy_start_buffer.take().unwrap_or_default();
                Observation::Finished {
                    entry,
                    exit: current.clone(),
                }
            }
        };
        self.last_buffer = current;
        observation
    }
}
