//! Version strings for `--version` and the startup log.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Short commit hash stamped by `build.rs`, or `unknown`.
pub const COMMIT: &str = env!("PANERELAY_COMMIT");

/// `panerelay --version` output.
pub const CLI_VERSION_TEXT: &str =
    concat!(env!("CARGO_PKG_VERSION"), " (", env!("PANERELAY_COMMIT"), ")");

pub fn startup_metadata_line() -> String {
    format!("v{VERSION} ({COMMIT})")
}
