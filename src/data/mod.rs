//! Persistence layer for all durable records.
//!
//! This module contains store structs that own the JSON-file-backed records
//! the bot keeps between restarts: per-guild application config, per-guild
//! panel records, and the shared question set. Stores load their file once
//! at startup, serve reads from memory, and rewrite the whole file on each
//! mutation. The on-disk formats match the original deployment's files, so
//! they can be carried over as-is.

pub mod guild_config;
pub mod panel;
pub mod question;

pub use guild_config::GuildConfigStore;
pub use panel::PanelStore;
pub use question::QuestionSet;
