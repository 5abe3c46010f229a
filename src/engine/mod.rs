//! Reply-capture engine: the coordinating poll loop.
//!
//! One tick runs in three phases:
//!
//! 1. capture every registered pane concurrently ([`poller`]),
//! 2. feed results through each session's state machine on this task
//!    ([`state`], [`extract`], [`dedup`], [`authorize`]),
//! 3. dispatch the resulting side effects (deliveries, keystrokes)
//!    concurrently and wait for all of them before the next tick.
//!
//! The session registry is re-read on the first tick and then every
//! `refresh_every_ticks` ticks.

pub mod authorize;
pub mod dedup;
pub mod extract;
pub mod poller;
pub mod rules;
pub mod snapshot;
pub mod state;

use crate::delivery::{DeliveryOutcome, DeliveryRequest, ReplySink};
use crate::registry::{with_fallback, Session, SessionRegistry};
use crate::textutil::{log_excerpt, prefix_by_chars};
use crate::tmux::Terminal;
use authorize::{AuthorizePolicy, Authorization};
use dedup::DedupLedger;
use poller::SnapshotPoller;
use rules::PromptRules;
use snapshot::Snapshot;
use state::{Observation, SessionState};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{interval, timeout, MissedTickBehavior};

/// Tunables for the engine, resolved from configuration.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    pub capture_rows: usize,
    pub capture_timeout: Duration,
    /// Registry re-read period in ticks; the first tick always refreshes.
    pub refresh_every_ticks: u64,
    pub min_workers: usize,
    pub max_workers: usize,
    pub rules: PromptRules,
    pub authorize: AuthorizePolicy,
    pub dedup_prefix_chars: usize,
    pub dedup_ceiling: usize,
    /// Polled instead of the registry when the registry is empty.
    pub fallback: Option<Session>,
    /// File holding the chat id used for sessions registered with chat id 0.
    pub active_chat_id_file: Option<PathBuf>,
    /// How long in-flight side effects may run after shutdown is signalled.
    pub shutdown_grace: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            capture_rows: 80,
            capture_timeout: Duration::from_millis(2000),
            refresh_every_ticks: 30,
            min_workers: 4,
            max_workers: 32,
            rules: PromptRules::default(),
            authorize: AuthorizePolicy::default(),
            dedup_prefix_chars: dedup::DEFAULT_PREFIX_CHARS,
            dedup_ceiling: dedup::DEFAULT_LEDGER_CEILING,
            fallback: None,
            active_chat_id_file: None,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Counters for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Sessions captured successfully.
    pub polled: usize,
    /// Sessions skipped because capture failed or timed out.
    pub skipped: usize,
    /// Busy periods that closed with an empty extraction.
    pub empty: usize,
    pub duplicates: usize,
    /// Fresh replies handed to delivery.
    pub replies: usize,
    pub delivered: usize,
    pub exhausted: usize,
    /// Fresh replies dropped because no chat id could be resolved.
    pub unaddressed: usize,
    pub authorizations: usize,
    pub failed_authorizations: usize,
}

/// A fresh reply that passed dedup, before its chat id is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyCandidate {
    pub session_name: String,
    pub text: String,
    pub fingerprint: String,
}

enum Action {
    Authorize(Authorization),
    Deliver(DeliveryRequest),
}

enum ActionResult {
    Authorized(bool),
    Delivered(DeliveryOutcome),
}

pub struct Engine {
    settings: EngineSettings,
    terminal: Arc<dyn Terminal>,
    sink: Arc<dyn ReplySink>,
    registry: Arc<dyn SessionRegistry>,
    poller: SnapshotPoller,
    sessions: Vec<Session>,
    states: HashMap<String, SessionState>,
    ticks: u64,
    shutdown: watch::Receiver<bool>,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        terminal: Arc<dyn Terminal>,
        sink: Arc<dyn ReplySink>,
        registry: Arc<dyn SessionRegistry>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let poller = SnapshotPoller::new(
            Arc::clone(&terminal),
            settings.capture_rows,
            settings.capture_timeout,
            settings.min_workers,
            settings.max_workers,
        );
        Self {
            settings,
            terminal,
            sink,
            registry,
            poller,
            sessions: Vec::new(),
            states: HashMap::new(),
            ticks: 0,
            shutdown,
        }
    }

    /// Sessions polled on the next tick.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn state(&self, name: &str) -> Option<&SessionState> {
        self.states.get(name)
    }

    /// Re-read the registry. On failure the previous session set is kept,
    /// or the fallback session is used when there is none yet.
    pub async fn refresh(&mut self) {
        let loaded = match self.registry.load().await {
            Ok(sessions) => sessions,
            Err(err) => {
                if self.sessions.is_empty() {
                    self.sessions = with_fallback(Vec::new(), self.settings.fallback.as_ref());
                }
                tracing::warn!(
                    error = %err,
                    kept = self.sessions.len(),
                    "registry refresh failed, keeping previous sessions"
                );
                return;
            }
        };
        let fresh = with_fallback(loaded, self.settings.fallback.as_ref());

        let before: BTreeSet<&str> = self.sessions.iter().map(|s| s.name.as_str()).collect();
        let after: BTreeSet<&str> = fresh.iter().map(|s| s.name.as_str()).collect();
        if before != after {
            let added: Vec<&str> = after.difference(&before).copied().collect();
            let removed: Vec<&str> = before.difference(&after).copied().collect();
            tracing::info!(?added, ?removed, total = after.len(), "session set changed");
        }
        // Metadata (endpoint, chat id, label) always follows the registry.
        self.sessions = fresh;
    }

    /// Run one full capture/process/dispatch cycle.
    pub async fn tick(&mut self) -> TickReport {
        let refresh_every = self.settings.refresh_every_ticks.max(1);
        if self.ticks % refresh_every == 0 {
            self.refresh().await;
        }
        self.ticks = self.ticks.wrapping_add(1);

        let mut report = TickReport::default();
        let captures = self.poller.capture_all(&self.sessions).await;

        let mut actions = Vec::new();
        let mut candidates = Vec::new();
        for (session, captured) in captures {
            let snapshot = match captured {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    tracing::warn!(session = %session.name, error = %err, "snapshot failed, skipping");
                    report.skipped += 1;
                    continue;
                }
            };
            report.polled += 1;
            self.process(&session, snapshot, &mut actions, &mut candidates, &mut report);
        }

        if !candidates.is_empty() {
            self.address(candidates, &mut actions, &mut report).await;
        }
        if !actions.is_empty() {
            self.dispatch(actions, &mut report).await;
        }
        report
    }

    /// Drive ticks on a fixed interval until shutdown is signalled.
    pub async fn run(mut self) {
        tracing::info!(
            interval_ms = self.settings.poll_interval.as_millis() as u64,
            "reply relay started"
        );
        let mut ticker = interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    tracing::debug!(?report, "tick finished");
                }
                _ = wait_for_shutdown(&mut self.shutdown) => break,
            }
        }
        tracing::info!("reply relay stopped");
    }

    fn process(
        &mut self,
        session: &Session,
        snapshot: Snapshot,
        actions: &mut Vec<Action>,
        candidates: &mut Vec<(Session, ReplyCandidate)>,
        report: &mut TickReport,
    ) {
        let settings = &self.settings;
        let Some(state) = self.states.get_mut(&session.name) else {
            let ledger = DedupLedger::new(settings.dedup_prefix_chars, settings.dedup_ceiling);
            let state = SessionState::new(snapshot, &settings.rules, ledger);
            tracing::debug!(session = %session.name, phase = ?state.phase(), "tracking session");
            self.states.insert(session.name.clone(), state);
            return;
        };

        match state.observe(snapshot, &settings.rules) {
            Observation::Unchanged => {}
            Observation::Settled => {
                tracing::trace!(session = %session.name, "idle screen changed");
            }
            Observation::Busy { entered } => {
                if entered {
                    tracing::debug!(session = %session.name, "session busy");
                }
                if let Some(auth) = settings.authorize.inspect(
                    &session.name,
                    &session.target,
                    state.last_buffer(),
                    &settings.rules,
                ) {
                    actions.push(Action::Authorize(auth));
                }
            }
            Observation::Finished { entry, exit } => {
                let text = extract::extract_reply(&entry, &exit, &settings.rules);
                if text.is_empty() {
                    tracing::debug!(session = %session.name, "busy period ended without a reply");
                    report.empty += 1;
                    return;
                }
                match state.seen_mut().admit(&text) {
                    None => {
                        tracing::debug!(
                            session = %session.name,
                            text = %log_excerpt(&text, 60),
                            "duplicate reply suppressed"
                        );
                        report.duplicates += 1;
                    }
                    Some(fingerprint) => {
                        report.replies += 1;
                        candidates.push((
                            session.clone(),
                            ReplyCandidate {
                                session_name: session.name.clone(),
                                text,
                                fingerprint,
                            },
                        ));
                    }
                }
            }
        }
    }

    /// Resolve chat ids and turn candidates into delivery actions.
    async fn address(
        &self,
        candidates: Vec<(Session, ReplyCandidate)>,
        actions: &mut Vec<Action>,
        report: &mut TickReport,
    ) {
        let mut active_chat: Option<i64> = None;
        for (session, candidate) in candidates {
            let mut chat_id = session.chat_id;
            if chat_id == 0 {
                if active_chat.is_none() {
                    active_chat = Some(match &self.settings.active_chat_id_file {
                        Some(path) => read_active_chat_id(path).await,
                        None => 0,
                    });
                }
                chat_id = active_chat.unwrap_or(0);
            }
            if chat_id == 0 {
                tracing::warn!(
                    session = %candidate.session_name,
                    text = %log_excerpt(&candidate.text, 80),
                    "no chat id for reply, not sending"
                );
                report.unaddressed += 1;
                continue;
            }
            tracing::info!(
                session = %candidate.session_name,
                fingerprint = %prefix_by_chars(&candidate.fingerprint, 12),
                text = %log_excerpt(&candidate.text, 60),
                "reply captured"
            );
            actions.push(Action::Deliver(DeliveryRequest {
                session: candidate.session_name,
                endpoint: session.endpoint,
                chat_id,
                text: candidate.text,
                bot_label: session.bot_label,
            }));
        }
    }

    /// Run all side effects concurrently and wait for them. After shutdown
    /// they get `shutdown_grace` to finish before being aborted.
    async fn dispatch(&mut self, actions: Vec<Action>, report: &mut TickReport) {
        let mut inflight = JoinSet::new();
        for action in actions {
            match action {
                Action::Authorize(auth) => {
                    let terminal = Arc::clone(&self.terminal);
                    inflight.spawn(async move {
                        ActionResult::Authorized(authorize::apply(terminal.as_ref(), &auth).await)
                    });
                }
                Action::Deliver(request) => {
                    let sink = Arc::clone(&self.sink);
                    inflight.spawn(async move { ActionResult::Delivered(sink.deliver(&request).await) });
                }
            }
        }

        let mut interrupted = false;
        loop {
            tokio::select! {
                biased;
                joined = inflight.join_next() => match joined {
                    Some(result) => tally(result, report),
                    None => break,
                },
                _ = wait_for_shutdown(&mut self.shutdown) => {
                    interrupted = true;
                    break;
                }
            }
        }
        if !interrupted || inflight.is_empty() {
            return;
        }

        let grace = self.settings.shutdown_grace;
        let drained = timeout(grace, async {
            while let Some(result) = inflight.join_next().await {
                tally(result, report);
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!(
                pending = inflight.len(),
                grace_ms = grace.as_millis() as u64,
                "aborting side effects after shutdown grace"
            );
            inflight.abort_all();
        }
    }
}

fn tally(result: Result<ActionResult, JoinError>, report: &mut TickReport) {
    match result {
        Ok(ActionResult::Authorized(true)) => report.authorizations += 1,
        Ok(ActionResult::Authorized(false)) => report.failed_authorizations += 1,
        Ok(ActionResult::Delivered(outcome)) if outcome.delivered => report.delivered += 1,
        Ok(ActionResult::Delivered(_)) => report.exhausted += 1,
        Err(err) => tracing::warn!(error = %err, "side-effect task failed"),
    }
}

/// Chat id stored in `path`; 0 when missing or unparsable.
async fn read_active_chat_id(path: &Path) -> i64 {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => text.trim().parse().unwrap_or_else(|_| {
            tracing::debug!(path = %path.display(), "active chat id file is not a number");
            0
        }),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "active chat id unavailable");
            0
        }
    }
}

/// Resolve once shutdown is signalled. A dropped sender never resolves.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
