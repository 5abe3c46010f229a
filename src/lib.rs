//! panerelay relays assistant replies out of tmux panes to chat endpoints.
//!
//! The crate watches interactive AI assistant CLIs, one per tmux pane, and
//! decides from screen content alone when a reply is finished. Finished
//! replies are extracted, deduplicated and POSTed to the session's endpoint.
//! Interactive `[y/n/t]` prompts are answered automatically along the way.
//!
//! # Quick start
//!
//! ```no_run
//! use panerelay::config::load_config;
//! use panerelay::delivery::HttpDispatcher;
//! use panerelay::engine::Engine;
//! use panerelay::registry::FileRegistry;
//! use panerelay::tmux::TmuxClient;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let (_stop, shutdown) = tokio::sync::watch::channel(false);
//! let engine = Engine::new(
//!     config.engine_settings().unwrap(),
//!     Arc::new(TmuxClient::new(config.tmux.socket.clone())),
//!     Arc::new(HttpDispatcher::new(
//!         config.delivery_timeout(),
//!         config.retry_policy(),
//!         &config.delivery.reply_path,
//!     )),
//!     Arc::new(FileRegistry::new(config.registry.path.clone())),
//!     shutdown,
//! );
//! engine.run().await;
//! # }
//! ```

pub mod build_info;
pub mod config;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod registry;
#[cfg(test)]
pub mod testsupport;
pub mod textutil;
pub mod tmux;
