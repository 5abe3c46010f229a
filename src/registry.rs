//! Session registry: which panes to watch and where their replies go.
//!
//! The registry is an external collaborator that the engine only polls. The
//! shipped backend is a TOML file re-read on every refresh:
//!
//! ```toml
//! [sessions.kiro]
//! bot_label = "kiro"
//! endpoint = "http://127.0.0.1:15001"
//! chat_id = 7943234085
//! group = "master"
//! target = "master:0.0"   # optional, defaults to "{group}:{name}.0"
//! ```

use crate::error::RegistryError;
use crate::tmux::PaneTarget;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Group used when an entry does not name one.
pub const DEFAULT_GROUP: &str = "worker";

/// One relayed assistant session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Stable name; keys the engine's per-session state.
    pub name: String,
    pub target: PaneTarget,
    /// Base URL of the reply endpoint.
    pub endpoint: String,
    /// Target chat; 0 means "use the active chat".
    pub chat_id: i64,
    /// Name reported to the endpoint as `bot_name`.
    pub bot_label: String,
    pub group: String,
}

/// Registry row as stored on disk, keyed by session name.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryEntry {
    #[serde(default)]
    pub bot_label: Option<String>,
    #[serde(alias = "api_url")]
    pub endpoint: String,
    #[serde(default)]
    pub chat_id: i64,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub target: Option<PaneTarget>,
}

impl RegistryEntry {
    /// Resolve defaults and validate into a [`Session`].
    pub fn into_session(self, name: &str) -> Result<Session, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::Invalid("session name must not be empty".into()));
        }
        let endpoint = self.endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(RegistryError::Invalid(format!(
                "session `{name}` has an empty endpoint"
            )));
        }
        let group = self
            .group
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| DEFAULT_GROUP.to_string());
        let target = self
            .target
            .unwrap_or_else(|| PaneTarget::format_win_id(&group, name, 0));
        let bot_label = self
            .bot_label
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| name.to_string());
        Ok(Session {
            name: name.to_string(),
            target,
            endpoint,
            chat_id: self.chat_id,
            bot_label,
            group,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    sessions: BTreeMap<String, RegistryEntry>,
}

/// Parse registry TOML into sessions ordered by name.
pub fn parse_registry(text: &str) -> Result<Vec<Session>, RegistryError> {
    let file: RegistryFile = toml::from_str(text)?;
    file.sessions
        .into_iter()
        .map(|(name, entry)| entry.into_session(&name))
        .collect()
}

/// Source of the current session set. Polled, never pushed.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    async fn load(&self) -> Result<Vec<Session>, RegistryError>;
}

/// TOML-file registry re-read on every call.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionRegistry for FileRegistry {
    async fn load(&self) -> Result<Vec<Session>, RegistryError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => parse_registry(&text),
            // No file yet means no registered sessions, not a failure.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "registry file not found");
                Ok(Vec::new())
            }
            Err(err) => Err(RegistryError::Io(err)),
        }
    }
}

/// Use `fallback` when the registry has no sessions at all.
pub fn with_fallback(sessions: Vec<Session>, fallback: Option<&Session>) -> Vec<Session> {
    match fallback {
        Some(session) if sessions.is_empty() => vec![session.clone()],
        _ => sessions,
    }
}
