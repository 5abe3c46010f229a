//! Configuration loading from TOML files and environment variables.
//!
//! Config is resolved in this order of precedence (highest wins):
//! 1. CLI flags (applied by the binary through [`CliOverrides`])
//! 2. Environment variables (`PANERELAY_TMUX_SOCKET`,
//!    `PANERELAY_POLL_INTERVAL_MS`, `PANERELAY_REGISTRY`, `PANERELAY_API_URL`)
//!    with legacy `TMUX_SOCKET` / `SESSION_REGISTRY` fallback
//! 3. TOML file specified via `--config`
//! 4. `./panerelay.toml` in the current directory
//! 5. `$XDG_CONFIG_HOME/panerelay/panerelay.toml` (or `~/.config/...`)
//! 6. Built-in defaults

mod defaults;
mod env;
mod loader;
mod sources;
mod types;

use std::path::PathBuf;

pub use loader::{load_config, load_config_with_diagnostics, parse_config};
pub use sources::config_root_dir;
pub use types::{
    AuthorizeConfig, Config, ConfigDiagnostics, DedupConfig, DeliveryConfig, FallbackConfig,
    LoadedConfig, PollConfig, RegistryConfig, TmuxConfig,
};

/// Command-line values that win over every other source.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub registry: Option<PathBuf>,
    pub tmux_socket: Option<String>,
    pub interval_ms: Option<u64>,
}

impl Config {
    pub fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(path) = &overrides.registry {
            self.registry.path = path.clone();
        }
        if let Some(socket) = &overrides.tmux_socket {
            self.tmux.socket = Some(socket.clone());
        }
        if let Some(interval) = overrides.interval_ms {
            self.poll.interval_ms = interval;
        }
        self.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::loader::load_config_with_diagnostics_from_sources;
    use super::*;
    use crate::engine::rules::LineMatcher;
    use crate::error::ConfigError;
    use crate::tmux::PaneTarget;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn defaults_are_sensible() {
        let config = parse_config("").unwrap();
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.poll.capture_rows, 80);
        assert_eq!(config.poll.refresh_every_ticks, 30);
        assert_eq!(config.poll.min_workers, 4);
        assert_eq!(config.poll.max_workers, 32);
        assert_eq!(config.delivery.timeout_secs, 10);
        assert_eq!(config.delivery.max_attempts, 3);
        assert_eq!(config.delivery.reply_path, "/reply");
        assert_eq!(config.dedup.prefix_chars, 200);
        assert_eq!(config.dedup.ceiling, 200);
        assert!(config.authorize.enabled);
        assert_eq!(config.authorize.response_key, "t");
        assert_eq!(config.registry.path, PathBuf::from("sessions.toml"));
        assert!(config.tmux.socket.is_none());
        assert!(config.fallback.is_none());

        let policy = config.retry_policy();
        assert_eq!(policy.base_delay, Duration::from_millis(2000));
        assert_eq!(config.delivery_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn parse_partial_toml() {
        let config = parse_config(
            r#"
            [poll]
            interval_ms = 500

            [tmux]
            socket = "/tmp/relay.sock"

            [delivery]
            max_attempts = 5
            active_chat_id_file = "/var/lib/relay/active_chat_id"

            [prompt]
            idle = [{ prefix = "$" }]
            reply_labels = []
            "#,
        )
        .unwrap();
        assert_eq!(config.poll.interval_ms, 500);
        assert_eq!(config.poll.capture_rows, 80);
        assert_eq!(config.tmux.socket.as_deref(), Some("/tmp/relay.sock"));
        assert_eq!(config.delivery.max_attempts, 5);
        assert_eq!(
            config.delivery.active_chat_id_file,
            Some(PathBuf::from("/var/lib/relay/active_chat_id"))
        );
        assert_eq!(config.prompt.idle, vec![LineMatcher::prefix("$")]);
        assert!(config.prompt.reply_labels.is_empty());
        // Untouched rule lists keep their defaults.
        assert!(!config.prompt.chrome.is_empty());
    }

    #[test]
    fn zero_values_are_clamped() {
        let config = parse_config(
            r#"
            [poll]
            interval_ms = 0
            min_workers = 0
            max_workers = 0

            [delivery]
            max_attempts = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.poll.interval_ms, 1);
        assert_eq!(config.poll.min_workers, 1);
        assert_eq!(config.poll.max_workers, 1);
        assert_eq!(config.delivery.max_attempts, 1);
    }

    #[test]
    fn empty_response_key_is_rejected_when_enabled() {
        let err = parse_config("[authorize]\nresponse_key = \" \"\n").unwrap_err();
        assert!(err.to_string().contains("response_key"), "got: {err}");

        parse_config("[authorize]\nenabled = false\nresponse_key = \"\"\n").unwrap();
    }

    #[test]
    fn fallback_section_resolves_to_session() {
        let config = parse_config(
            r#"
            [fallback]
            endpoint = "http://localhost:15001/"
            "#,
        )
        .unwrap();
        let settings = config.engine_settings().unwrap();
        let fallback = settings.fallback.expect("fallback session");
        assert_eq!(fallback.name, "kiro");
        assert_eq!(fallback.target, PaneTarget::new("master:0.0"));
        assert_eq!(fallback.endpoint, "http://localhost:15001");
        assert_eq!(fallback.chat_id, 0);
    }

    #[test]
    fn invalid_fallback_is_a_config_error() {
        let err = parse_config("[fallback]\nendpoint = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
    }

    #[test]
    fn engine_settings_carry_config_values() {
        let config = parse_config(
            r#"
            [poll]
            interval_ms = 750
            capture_timeout_ms = 300

            [authorize]
            enabled = false

            [dedup]
            ceiling = 10
            "#,
        )
        .unwrap();
        let settings = config.engine_settings().unwrap();
        assert_eq!(settings.poll_interval, Duration::from_millis(750));
        assert_eq!(settings.capture_timeout, Duration::from_millis(300));
        assert!(!settings.authorize.enabled);
        assert_eq!(settings.dedup_ceiling, 10);
        assert_eq!(settings.shutdown_grace, Duration::from_secs(5));
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = parse_config("[poll]\ninterval_ms = 500\n").unwrap();
        config.apply_overrides(&CliOverrides {
            registry: Some(PathBuf::from("/etc/relay/sessions.toml")),
            tmux_socket: Some("/tmp/s".into()),
            interval_ms: Some(0),
        });
        assert_eq!(config.registry.path, PathBuf::from("/etc/relay/sessions.toml"));
        assert_eq!(config.tmux.socket.as_deref(), Some("/tmp/s"));
        assert_eq!(config.poll.interval_ms, 1);
    }

    #[test]
    fn injected_sources_prefer_local_file_over_global() {
        let mut files = BTreeMap::new();
        files.insert("panerelay.toml".to_string(), "[poll]\ninterval_ms = 111\n".to_string());
        files.insert(
            "/cfg/panerelay/panerelay.toml".to_string(),
            "[poll]\ninterval_ms = 222\n".to_string(),
        );
        let loaded =
            load_with_sources_for_test(None, files, BTreeMap::new(), Some(PathBuf::from("/cfg")))
                .unwrap();
        assert_eq!(loaded.config.poll.interval_ms, 111);
        assert_eq!(loaded.source, Some(PathBuf::from("panerelay.toml")));
    }

    #[test]
    fn injected_sources_fall_back_to_global_then_defaults() {
        let mut files = BTreeMap::new();
        files.insert(
            "/cfg/panerelay/panerelay.toml".to_string(),
            "[poll]\ninterval_ms = 222\n".to_string(),
        );
        let loaded = load_with_sources_for_test(
            None,
            files,
            BTreeMap::new(),
            Some(PathBuf::from("/cfg")),
        )
        .unwrap();
        assert_eq!(loaded.config.poll.interval_ms, 222);

        let loaded =
            load_with_sources_for_test(None, BTreeMap::new(), BTreeMap::new(), None).unwrap();
        assert_eq!(loaded.config.poll.interval_ms, 2000);
        assert!(loaded.source.is_none());
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = load_with_sources_for_test(
            Some(Path::new("/missing.toml")),
            BTreeMap::new(),
            BTreeMap::new(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)), "got: {err}");
    }

    #[test]
    fn injected_sources_apply_env_overrides() {
        let mut files = BTreeMap::new();
        files.insert("/etc/relay.toml".to_string(), "[poll]\ninterval_ms = 900\n".to_string());
        let mut env = BTreeMap::new();
        env.insert("PANERELAY_POLL_INTERVAL_MS".to_string(), "250".to_string());
        env.insert("PANERELAY_TMUX_SOCKET".to_string(), "/tmp/a.sock".to_string());
        env.insert("PANERELAY_REGISTRY".to_string(), "/data/sessions.toml".to_string());
        env.insert("PANERELAY_API_URL".to_string(), "http://localhost:16000".to_string());

        let loaded =
            load_with_sources_for_test(Some(Path::new("/etc/relay.toml")), files, env, None)
                .unwrap();
        assert_eq!(loaded.config.poll.interval_ms, 250);
        assert_eq!(loaded.config.tmux.socket.as_deref(), Some("/tmp/a.sock"));
        assert_eq!(loaded.config.registry.path, PathBuf::from("/data/sessions.toml"));
        let fallback = loaded.config.fallback.expect("api url enables fallback");
        assert_eq!(fallback.endpoint, "http://localhost:16000");
        assert!(loaded.diagnostics.deprecations.is_empty());
    }

    #[test]
    fn invalid_env_interval_is_rejected() {
        let mut env = BTreeMap::new();
        env.insert("PANERELAY_POLL_INTERVAL_MS".to_string(), "soon".to_string());
        let err = load_with_sources_for_test(None, BTreeMap::new(), env, None).unwrap_err();
        assert!(err.to_string().contains("PANERELAY_POLL_INTERVAL_MS"), "got: {err}");
    }

    #[test]
    fn injected_sources_warn_for_legacy_env_aliases() {
        let mut env = BTreeMap::new();
        env.insert("TMUX_SOCKET".to_string(), "/tmp/legacy.sock".to_string());
        env.insert("SESSION_REGISTRY".to_string(), "/old/sessions.toml".to_string());

        let loaded = load_with_sources_for_test(None, BTreeMap::new(), env, None).unwrap();
        assert_eq!(loaded.config.tmux.socket.as_deref(), Some("/tmp/legacy.sock"));
        assert_eq!(loaded.config.registry.path, PathBuf::from("/old/sessions.toml"));
        assert_eq!(loaded.diagnostics.deprecations.len(), 2);
        assert!(loaded
            .diagnostics
            .deprecations
            .iter()
            .any(|msg| msg.contains("TMUX_SOCKET")));
    }

    fn load_with_sources_for_test(
        path_override: Option<&Path>,
        files: BTreeMap<String, String>,
        env: BTreeMap<String, String>,
        config_root: Option<PathBuf>,
    ) -> Result<LoadedConfig, ConfigError> {
        load_config_with_diagnostics_from_sources(
            path_override,
            move |path| {
                let key = path.to_string_lossy().into_owned();
                files
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, key))
            },
            move |name| env.get(name).cloned(),
            move || config_root.clone(),
        )
    }
}
