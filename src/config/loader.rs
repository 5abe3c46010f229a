//! Top-level config loading pipeline.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::env::{apply_runtime_env_overrides, collect_legacy_env_warnings, dedupe_diagnostics};
use super::sources::{config_root_dir, read_config_text_with_sources};
use super::{Config, ConfigDiagnostics, LoadedConfig};

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from `--config`).
pub fn load_config(path_override: Option<&Path>) -> Result<Config, ConfigError> {
    Ok(load_config_with_diagnostics(path_override)?.config)
}

/// Load configuration and return compatibility diagnostics.
pub fn load_config_with_diagnostics(
    path_override: Option<&Path>,
) -> Result<LoadedConfig, ConfigError> {
    load_config_with_diagnostics_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

/// Parse one TOML document into a normalized, validated config.
pub fn parse_config(text: &str) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(text)?;
    config.normalize();
    config.validate()?;
    Ok(config)
}

pub(super) fn load_config_with_diagnostics_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&Path>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (config_text, source) =
        read_config_text_with_sources(path_override, &read_file, &config_root)?;
    let mut diagnostics = ConfigDiagnostics::default();
    let mut config: Config = toml::from_str(&config_text)?;
    apply_runtime_env_overrides(&mut config, &env_lookup)?;
    config.normalize();
    config.validate()?;
    collect_legacy_env_warnings(&mut diagnostics, &env_lookup);
    dedupe_diagnostics(&mut diagnostics);

    Ok(LoadedConfig {
        config,
        diagnostics,
        source: source.path(),
    })
}
