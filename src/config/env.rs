//! Environment overrides and legacy env-alias handling.
//!
//! Canonical `PANERELAY_*` variables take precedence. The bare `TMUX_SOCKET`
//! and `SESSION_REGISTRY` names used by older launch scripts are accepted as
//! aliases and surfaced via diagnostics.

use std::path::PathBuf;

use crate::error::ConfigError;

use super::{Config, ConfigDiagnostics, FallbackConfig};

pub(super) const ENV_TMUX_SOCKET: &str = "PANERELAY_TMUX_SOCKET";
pub(super) const ENV_POLL_INTERVAL_MS: &str = "PANERELAY_POLL_INTERVAL_MS";
pub(super) const ENV_REGISTRY: &str = "PANERELAY_REGISTRY";
pub(super) const ENV_API_URL: &str = "PANERELAY_API_URL";

const LEGACY_TMUX_SOCKET: &str = "TMUX_SOCKET";
const LEGACY_REGISTRY: &str = "SESSION_REGISTRY";

pub(super) fn apply_runtime_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(socket) = env_with_legacy(env_lookup, ENV_TMUX_SOCKET, LEGACY_TMUX_SOCKET) {
        config.tmux.socket = Some(socket);
    }
    if let Some(interval) = non_empty(env_lookup(ENV_POLL_INTERVAL_MS)) {
        // Clamp to at least 1ms so a zero never turns into a busy loop.
        let parsed = interval.parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid {ENV_POLL_INTERVAL_MS} value `{interval}`: expected positive integer milliseconds"
            ))
        })?;
        config.poll.interval_ms = parsed.max(1);
    }
    if let Some(path) = env_with_legacy(env_lookup, ENV_REGISTRY, LEGACY_REGISTRY) {
        config.registry.path = PathBuf::from(path);
    }
    if let Some(url) = non_empty(env_lookup(ENV_API_URL)) {
        config
            .fallback
            .get_or_insert_with(FallbackConfig::default)
            .endpoint = url;
    }
    Ok(())
}

/// Resolve a value from canonical env var or, if absent, its legacy alias.
pub(super) fn env_with_legacy<FEnv>(
    env_lookup: &FEnv,
    canonical: &str,
    legacy: &str,
) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    non_empty(env_lookup(canonical)).or_else(|| non_empty(env_lookup(legacy)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Record diagnostics for legacy env alias usage when canonical vars are absent.
pub(super) fn collect_legacy_env_warnings<FEnv>(
    diagnostics: &mut ConfigDiagnostics,
    env_lookup: &FEnv,
) where
    FEnv: Fn(&str) -> Option<String>,
{
    add_legacy_env_warning(diagnostics, env_lookup, ENV_TMUX_SOCKET, LEGACY_TMUX_SOCKET);
    add_legacy_env_warning(diagnostics, env_lookup, ENV_REGISTRY, LEGACY_REGISTRY);
}

/// Append one legacy-alias warning if only the legacy key is present.
fn add_legacy_env_warning<FEnv>(
    diagnostics: &mut ConfigDiagnostics,
    env_lookup: &FEnv,
    canonical: &str,
    legacy: &str,
) where
    FEnv: Fn(&str) -> Option<String>,
{
    if non_empty(env_lookup(canonical)).is_none() && non_empty(env_lookup(legacy)).is_some() {
        diagnostics.deprecations.push(format!(
            "Detected legacy env var `{legacy}`. Use {canonical} instead."
        ));
    }
}

/// Sort and deduplicate diagnostic strings for stable output.
pub(super) fn dedupe_diagnostics(diagnostics: &mut ConfigDiagnostics) {
    diagnostics.deprecations.sort();
    diagnostics.deprecations.dedup();
}
