//! Unified error types for the relay.

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// TerminalError
// ---------------------------------------------------------------------------

/// Errors from the terminal multiplexer (snapshot capture, key injection).
#[derive(Debug)]
pub enum TerminalError {
    /// The tmux command could not be spawned or exited non-zero.
    ExecutionFailed(String),
    /// The command did not finish within its budget.
    Timeout(Duration),
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed(msg) => write!(f, "execution failed: {msg}"),
            Self::Timeout(limit) => write!(f, "timed out after {}ms", limit.as_millis()),
        }
    }
}

impl std::error::Error for TerminalError {}

// ---------------------------------------------------------------------------
// DeliveryError
// ---------------------------------------------------------------------------

/// Errors from one delivery attempt against a reply endpoint.
#[derive(Debug)]
pub enum DeliveryError {
    /// Network / reqwest-level error, including per-attempt timeouts.
    Http(reqwest::Error),
    /// Non-2xx status from the endpoint.
    Status(u16, String),
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status(code, body) => write!(f, "status {code}: {body}"),
        }
    }
}

impl std::error::Error for DeliveryError {}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

/// Errors when reading the session registry.
#[derive(Debug)]
pub enum RegistryError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid registry: {msg}"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<std::io::Error> for RegistryError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for RegistryError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// RelayError: top-level
// ---------------------------------------------------------------------------

/// Top-level error for startup paths that cannot recover locally.
#[derive(Debug)]
pub enum RelayError {
    Config(ConfigError),
    Registry(RegistryError),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<ConfigError> for RelayError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<RegistryError> for RelayError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_error_display() {
        assert_eq!(
            TerminalError::ExecutionFailed("no server running".into()).to_string(),
            "execution failed: no server running"
        );
        assert_eq!(
            TerminalError::Timeout(Duration::from_millis(1500)).to_string(),
            "timed out after 1500ms"
        );
    }

    #[test]
    fn delivery_status_error_display() {
        let err = DeliveryError::Status(503, "busy".into());
        assert_eq!(err.to_string(), "status 503: busy");
    }

    #[test]
    fn registry_error_from_toml() {
        let toml_err: toml::de::Error = toml::from_str::<toml::Value>("x = [unclosed").unwrap_err();
        let e = RegistryError::from(toml_err);
        assert!(e.to_string().starts_with("toml:"));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e = ConfigError::from(io_err);
        let s = e.to_string();
        assert!(s.starts_with("io:"), "got: {s}");
        assert!(s.contains("file not found"));
    }

    #[test]
    fn relay_error_wraps_sources() {
        let e = RelayError::from(ConfigError::Invalid("poll.interval_ms".into()));
        assert_eq!(e.to_string(), "config: invalid config: poll.interval_ms");
        let e = RelayError::from(RegistryError::Invalid("empty name".into()));
        assert!(e.to_string().starts_with("registry:"), "got: {e}");
    }
}
