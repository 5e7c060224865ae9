//! Domain models shared across the data, service, and bot layers.
//!
//! This module contains the persisted record types (guild config, panel
//! record), the transient panel status, and the application log record built
//! when a session completes. Persisted types carry serde attributes matching
//! the on-disk JSON format of the original deployment, so existing
//! `config.json` / `embed.json` files load unchanged.

pub mod application;
pub mod config;
pub mod panel;

pub use application::ApplicationLog;
pub use config::GuildConfig;
pub use panel::{PanelRecord, PanelStatus};
