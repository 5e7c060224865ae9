//! Discord bot integration for the application intake system.
//!
//! This module provides the bot client construction and the gateway event
//! handlers: command registration and the startup panel resync on `ready`,
//! slash commands and the panel button on `interaction_create`, and the
//! direct-message reply routing on `message`.
//!
//! # Gateway Intents
//!
//! The bot requires the following gateway intents:
//! - `GUILDS` - Receive guild and interaction events
//! - `GUILD_MESSAGES` - Receive events about messages in guilds
//! - `DIRECT_MESSAGES` - Receive the applicants' DM replies
//! - `MESSAGE_CONTENT` - Read DM reply content (privileged intent)
//!
//! Note: `MESSAGE_CONTENT` is a privileged intent and must be explicitly
//! enabled in the Discord Developer Portal for the bot application.

pub mod handler;
pub mod start;
