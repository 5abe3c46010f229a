//! Configuration data model.
//!
//! This module holds struct definitions plus default values. Loading and
//! precedence behavior stays in `loader`/`sources`/`env`.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::{
    DEFAULT_CAPTURE_ROWS, DEFAULT_CAPTURE_TIMEOUT_MS, DEFAULT_DELIVERY_MAX_ATTEMPTS,
    DEFAULT_DELIVERY_TIMEOUT_SECS, DEFAULT_FALLBACK_ENDPOINT, DEFAULT_FALLBACK_GROUP,
    DEFAULT_FALLBACK_NAME, DEFAULT_FALLBACK_TARGET, DEFAULT_MAX_WORKERS, DEFAULT_MIN_WORKERS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_REFRESH_EVERY_TICKS, DEFAULT_REGISTRY_PATH,
    DEFAULT_RETRY_DELAY_MS, DEFAULT_SHUTDOWN_GRACE_SECS,
};
use crate::delivery::{RetryPolicy, DEFAULT_REPLY_PATH};
use crate::engine::authorize::AuthorizePolicy;
use crate::engine::dedup::{DEFAULT_LEDGER_CEILING, DEFAULT_PREFIX_CHARS};
use crate::engine::rules::PromptRules;
use crate::engine::EngineSettings;
use crate::error::ConfigError;
use crate::registry::{RegistryEntry, Session};
use crate::tmux::PaneTarget;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub poll: PollConfig,
    pub tmux: TmuxConfig,
    pub delivery: DeliveryConfig,
    pub dedup: DedupConfig,
    pub authorize: AuthorizeConfig,
    /// Screen conventions of the relayed assistant.
    pub prompt: PromptRules,
    pub registry: RegistryConfig,
    /// Session polled when the registry is empty. Absent means none.
    pub fallback: Option<FallbackConfig>,
}

/// Tick cadence and capture limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub capture_rows: usize,
    pub capture_timeout_ms: u64,
    pub refresh_every_ticks: u64,
    pub min_workers: usize,
    pub max_workers: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            capture_rows: DEFAULT_CAPTURE_ROWS,
            capture_timeout_ms: DEFAULT_CAPTURE_TIMEOUT_MS,
            refresh_every_ticks: DEFAULT_REFRESH_EVERY_TICKS,
            min_workers: DEFAULT_MIN_WORKERS,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

/// Which tmux server to talk to.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TmuxConfig {
    /// Socket path passed as `tmux -S`; default server when absent.
    pub socket: Option<String>,
}

/// Reply endpoint behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub reply_path: String,
    /// File holding the chat id for sessions registered with chat id 0.
    pub active_chat_id_file: Option<PathBuf>,
    pub shutdown_grace_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_DELIVERY_TIMEOUT_SECS,
            max_attempts: DEFAULT_DELIVERY_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            reply_path: DEFAULT_REPLY_PATH.to_string(),
            active_chat_id_file: None,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub prefix_chars: usize,
    pub ceiling: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            prefix_chars: DEFAULT_PREFIX_CHARS,
            ceiling: DEFAULT_LEDGER_CEILING,
        }
    }
}

/// Auto-authorization of `[y/n/t]` prompts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthorizeConfig {
    pub enabled: bool,
    pub context_lines: usize,
    pub response_key: String,
}

impl Default for AuthorizeConfig {
    fn default() -> Self {
        let policy = AuthorizePolicy::default();
        Self {
            enabled: policy.enabled,
            context_lines: policy.context_lines,
            response_key: policy.response_key,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_REGISTRY_PATH),
        }
    }
}

/// `[fallback]` session settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub name: String,
    pub target: Option<PaneTarget>,
    pub endpoint: String,
    pub chat_id: i64,
    pub bot_label: Option<String>,
    pub group: Option<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_FALLBACK_NAME.to_string(),
            target: Some(PaneTarget::new(DEFAULT_FALLBACK_TARGET)),
            endpoint: DEFAULT_FALLBACK_ENDPOINT.to_string(),
            chat_id: 0,
            bot_label: None,
            group: Some(DEFAULT_FALLBACK_GROUP.to_string()),
        }
    }
}

impl FallbackConfig {
    pub fn to_session(&self) -> Result<Session, ConfigError> {
        RegistryEntry {
            bot_label: self.bot_label.clone(),
            endpoint: self.endpoint.clone(),
            chat_id: self.chat_id,
            group: self.group.clone(),
            target: self.target.clone(),
        }
        .into_session(&self.name)
        .map_err(|e| ConfigError::Invalid(format!("invalid [fallback] session: {e}")))
    }
}

impl Config {
    /// Clamp numeric knobs so zero never means "no limit" or "never".
    pub(super) fn normalize(&mut self) {
        self.poll.interval_ms = self.poll.interval_ms.max(1);
        self.poll.capture_timeout_ms = self.poll.capture_timeout_ms.max(1);
        self.poll.refresh_every_ticks = self.poll.refresh_every_ticks.max(1);
        self.poll.min_workers = self.poll.min_workers.max(1);
        self.poll.max_workers = self.poll.max_workers.max(self.poll.min_workers);
        self.delivery.timeout_secs = self.delivery.timeout_secs.max(1);
        self.delivery.max_attempts = self.delivery.max_attempts.max(1);
        self.dedup.prefix_chars = self.dedup.prefix_chars.max(1);
        self.dedup.ceiling = self.dedup.ceiling.max(1);
        self.authorize.context_lines = self.authorize.context_lines.max(1);
        if self.tmux.socket.as_deref().is_some_and(|s| s.trim().is_empty()) {
            self.tmux.socket = None;
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.authorize.enabled && self.authorize.response_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "authorize.response_key must not be empty when authorize.enabled = true"
                    .to_string(),
            ));
        }
        if self.prompt.reply_marker.is_empty() && self.prompt.reply_labels.is_empty() {
            return Err(ConfigError::Invalid(
                "prompt.reply_marker and prompt.reply_labels cannot both be empty".to_string(),
            ));
        }
        if let Some(fallback) = &self.fallback {
            fallback.to_session()?;
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.delivery.max_attempts,
            base_delay: Duration::from_millis(self.delivery.retry_delay_ms),
        }
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery.timeout_secs)
    }

    /// Engine tunables resolved from this config.
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let fallback = self
            .fallback
            .as_ref()
            .map(FallbackConfig::to_session)
            .transpose()?;
        Ok(EngineSettings {
            poll_interval: Duration::from_millis(self.poll.interval_ms),
            capture_rows: self.poll.capture_rows,
            capture_timeout: Duration::from_millis(self.poll.capture_timeout_ms),
            refresh_every_ticks: self.poll.refresh_every_ticks,
            min_workers: self.poll.min_workers,
            max_workers: self.poll.max_workers,
            rules: self.prompt.clone(),
            authorize: AuthorizePolicy {
                enabled: self.authorize.enabled,
                context_lines: self.authorize.context_lines,
                response_key: self.authorize.response_key.clone(),
            },
            dedup_prefix_chars: self.dedup.prefix_chars,
            dedup_ceiling: self.dedup.ceiling,
            fallback,
            active_chat_id_file: self.delivery.active_chat_id_file.clone(),
            shutdown_grace: Duration::from_secs(self.delivery.shutdown_grace_secs),
        })
    }
}

/// Diagnostics captured while resolving runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigDiagnostics {
    /// Legacy compatibility paths currently in use.
    pub deprecations: Vec<String>,
}

/// Configuration payload plus load-time diagnostics.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub diagnostics: ConfigDiagnostics,
    /// File the config was read from; `None` for built-in defaults.
    pub source: Option<PathBuf>,
}
