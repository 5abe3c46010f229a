//! CLI argument parsing via clap.

use clap::Parser;
use panerelay::build_info::CLI_VERSION_TEXT;
use panerelay::config::CliOverrides;
use std::path::PathBuf;

/// Relay replies from assistant CLIs running in tmux panes to chat endpoints.
#[derive(Debug, Parser)]
#[command(name = "panerelay", version, long_version = CLI_VERSION_TEXT)]
pub struct Args {
    /// Path to config file (default: ./panerelay.toml or ~/.config/panerelay/panerelay.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Override the session registry file.
    #[arg(short = 'r', long = "registry")]
    pub registry: Option<PathBuf>,

    /// Talk to the tmux server listening on this socket (`tmux -S`).
    #[arg(long = "tmux-socket")]
    pub tmux_socket: Option<String>,

    /// Override the poll interval in milliseconds.
    #[arg(long = "interval-ms")]
    pub interval_ms: Option<u64>,

    /// Run a single tick and exit.
    #[arg(long = "once")]
    pub once: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            registry: self.registry.clone(),
            tmux_socket: self.tmux_socket.clone(),
            interval_ms: self.interval_ms,
        }
    }
}
