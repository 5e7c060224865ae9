//! Panel record and panel status types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serenity::all::{ChannelId, MessageId};

/// The persisted state of a guild's application panel message.
///
/// The embed snapshot is kept as raw JSON (the serialized embed object) so
/// the resync job can re-apply it byte-for-byte without reinterpreting it.
/// `embed_message_id` refers to a message whose lifetime is external: it may
/// be deleted out-of-band, and every consumer must tolerate its absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelRecord {
    /// Channel the panel message was posted to.
    pub embed_channel_id: ChannelId,
    /// Serialized embed content, re-applied verbatim on every resync.
    pub embed: serde_json::Value,
    /// Id of the posted panel message, if one was ever sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_message_id: Option<MessageId>,
}

/// Whether a guild currently accepts new applications.
///
/// Transient, process-lifetime state: every guild reverts to `Open` on
/// restart. Only new session starts are gated; sessions already in flight
/// are unaffected by a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelStatus {
    #[default]
    Open,
    Closed,
}

impl PanelStatus {
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for PanelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "opened"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Error returned for a status string that is neither `open` nor `close`.
///
/// Invalid statuses are rejected outright, never coerced to a default.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid panel status '{0}', expected 'open' or 'close'")]
pub struct InvalidPanelStatus(pub String);

impl FromStr for PanelStatus {
    type Err = InvalidPanelStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(Self::Open),
            "close" => Ok(Self::Closed),
            other => Err(InvalidPanelStatus(other.to_string())),
        }
    }
}
