//! Outbound platform effects behind a trait seam.
//!
//! The intake pipeline only ever touches Discord through [`Outbound`], so
//! the whole session flow can be exercised in tests with a fake
//! implementation. The production implementation wraps serenity's shared
//! HTTP client, mirroring how other services hold an `Arc<Http>`.

use std::sync::Arc;

use serenity::all::{
    ChannelId, CreateEmbed, CreateMessage, GuildId, RoleId, Timestamp, UserId,
};
use serenity::async_trait;
use serenity::http::Http;

use crate::error::AppError;
use crate::model::ApplicationLog;

/// External effects requested by an application session.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Delivers `text` to the user's direct-message channel.
    async fn send_dm(&self, user_id: UserId, text: &str) -> Result<(), AppError>;

    /// Publishes a completed application record to a guild log channel.
    async fn publish_log(
        &self,
        channel_id: ChannelId,
        record: &ApplicationLog,
    ) -> Result<(), AppError>;

    /// Grants the configured role to the applicant.
    async fn grant_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), AppError>;
}

/// Production [`Outbound`] backed by the Discord REST API.
pub struct DiscordOutbound {
    http: Arc<Http>,
}

impl DiscordOutbound {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Outbound for DiscordOutbound {
    async fn send_dm(&self, user_id: UserId, text: &str) -> Result<(), AppError> {
        let channel = user_id.create_dm_channel(&self.http).await?;
        channel
            .id
            .send_message(&self.http, CreateMessage::new().content(text))
            .await?;

        Ok(())
    }

    async fn publish_log(
        &self,
        channel_id: ChannelId,
        record: &ApplicationLog,
    ) -> Result<(), AppError> {
        let timestamp = Timestamp::from_unix_timestamp(record.timestamp.timestamp())
            .map_err(|e| AppError::InternalError(format!("Invalid timestamp: {}", e)))?;

        let mut embed = CreateEmbed::new().title(&record.title).timestamp(timestamp);
        for (question, answer) in &record.fields {
            // Discord rejects empty field values; an attachment-only reply
            // has no text content.
            let answer = if answer.is_empty() { "(no text)" } else { answer };
            embed = embed.field(question, answer, false);
        }

        channel_id
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await?;

        Ok(())
    }

    async fn grant_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), AppError> {
        self.http
            .add_member_role(guild_id, user_id, role_id, Some("Application approved"))
            .await?;

        Ok(())
    }
}
