//! Per-guild application configuration record.

use serde::{Deserialize, Serialize};
use serenity::all::{ChannelId, RoleId};

/// Where a guild's completed applications go and which role a successful
/// applicant receives.
///
/// Created or overwritten by the `/setup` command; read-only to the intake
/// pipeline. Serialized keyed by guild id in `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildConfig {
    /// Channel that receives the application log embed.
    pub log_channel_id: ChannelId,
    /// Role granted to the applicant on completion.
    pub role_id: RoleId,
}
