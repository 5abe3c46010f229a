//! Default configuration constants.
//!
//! Keeping defaults in one module lets config types, env parsing and tests
//! share the same literals.

/// Poll tick period.
pub(super) const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
/// Pane rows kept per capture.
pub(super) const DEFAULT_CAPTURE_ROWS: usize = 80;
/// Budget for one pane capture.
pub(super) const DEFAULT_CAPTURE_TIMEOUT_MS: u64 = 2000;
/// Registry re-read period, in ticks.
pub(super) const DEFAULT_REFRESH_EVERY_TICKS: u64 = 30;
pub(super) const DEFAULT_MIN_WORKERS: usize = 4;
pub(super) const DEFAULT_MAX_WORKERS: usize = 32;

/// Per-attempt timeout for reply delivery.
pub(super) const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 10;
pub(super) const DEFAULT_DELIVERY_MAX_ATTEMPTS: u32 = 3;
/// Backoff unit between delivery attempts.
pub(super) const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub(super) const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Registry file used when none is configured.
pub(super) const DEFAULT_REGISTRY_PATH: &str = "sessions.toml";

/// Fallback session polled when the registry is empty.
pub(super) const DEFAULT_FALLBACK_NAME: &str = "kiro";
pub(super) const DEFAULT_FALLBACK_GROUP: &str = "master";
pub(super) const DEFAULT_FALLBACK_TARGET: &str = "master:0.0";
pub(super) const DEFAULT_FALLBACK_ENDPOINT: &str = "http://localhost:15001";

/// Config file name, local (`./panerelay.toml`) and global.
pub(super) const CONFIG_FILE_NAME: &str = "panerelay.toml";
/// Directory under the user config root holding the global config.
pub(super) const CONFIG_DIR_NAME: &str = "panerelay";
