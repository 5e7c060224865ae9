//! Panel gate, panel rendering, and the idempotent resync batch.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serenity::all::{
    ButtonStyle, ChannelId, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter,
    CreateMessage, EditMessage, Embed, GuildId, MessageId, RoleId,
};
use serenity::http::Http;

use crate::data::{GuildConfigStore, PanelStore};
use crate::error::AppError;
use crate::model::{GuildConfig, PanelRecord, PanelStatus};

/// Custom id carried by the panel button; button interactions are matched
/// against this.
pub const APPLY_BUTTON_ID: &str = "start_application";

/// Per-guild open/closed admission control for new application starts.
///
/// Process-lifetime state: every guild reverts to `Open` on restart. Only
/// new starts consult the gate; sessions already in flight never re-check
/// it.
#[derive(Default)]
pub struct PanelGate {
    statuses: RwLock<HashMap<GuildId, PanelStatus>>,
}

impl PanelGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, guild_id: GuildId) -> PanelStatus {
        self.statuses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&guild_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_status(&self, guild_id: GuildId, status: PanelStatus) {
        self.statuses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(guild_id, status);
    }
}

/// Inputs collected by `/setup` for publishing a guild's panel.
pub struct PanelSetup {
    pub guild_id: GuildId,
    pub log_channel_id: ChannelId,
    pub embed_channel_id: ChannelId,
    pub role_id: RoleId,
    pub color: u32,
    pub footer_text: String,
    pub footer_icon: String,
    pub thumbnail: String,
    pub image: Option<String>,
}

/// Parses a `#rrggbb` or `rrggbb` hex color string.
pub fn parse_embed_color(value: &str) -> Option<u32> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

fn panel_button(status: PanelStatus) -> CreateButton {
    match status {
        PanelStatus::Open => CreateButton::new(APPLY_BUTTON_ID)
            .label("Apply Now")
            .style(ButtonStyle::Primary),
        PanelStatus::Closed => CreateButton::new(APPLY_BUTTON_ID)
            .label("Applications are closed")
            .style(ButtonStyle::Danger)
            .disabled(true),
    }
}

pub fn panel_components(status: PanelStatus) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![panel_button(status)])]
}

/// Builds the panel embed published by `/setup`.
pub fn build_panel_embed(setup: &PanelSetup) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("Application Panel")
        .description("Click the button below to start your application.")
        .color(setup.color)
        .footer(CreateEmbedFooter::new(&setup.footer_text).icon_url(&setup.footer_icon))
        .thumbnail(&setup.thumbnail);
    if let Some(image) = &setup.image {
        embed = embed.image(image);
    }

    embed
}

/// Rebuilds the panel message content from a record and gate status.
///
/// Pure with respect to its inputs: the same record and status always yield
/// identical output, which is what makes the resync batch idempotent.
pub fn panel_edit(record: &PanelRecord, status: PanelStatus) -> Result<EditMessage, AppError> {
    let embed: Embed = serde_json::from_value(record.embed.clone())?;

    Ok(EditMessage::new()
        .embed(CreateEmbed::from(embed))
        .components(panel_components(status)))
}

/// Re-applies the recorded snapshot and button state to the persisted panel
/// message.
///
/// Returns `Ok(false)` when the message no longer exists; the record is
/// left untouched and no replacement is created.
pub async fn render_panel(
    http: &Arc<Http>,
    record: &PanelRecord,
    message_id: MessageId,
    status: PanelStatus,
) -> Result<bool, AppError> {
    match http.get_message(record.embed_channel_id, message_id).await {
        Ok(_) => {
            record
                .embed_channel_id
                .edit_message(http, message_id, panel_edit(record, status)?)
                .await?;
            Ok(true)
        }
        Err(e) if is_missing_message(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn is_missing_message(err: &serenity::Error) -> bool {
    matches!(
        err,
        serenity::Error::Http(serenity::http::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}

/// One resync pass over every guild with a live panel message.
///
/// Each run is independent and idempotent. A guild whose fetch or edit
/// fails is logged and skipped without aborting the rest of the batch.
pub async fn resync_all(http: &Arc<Http>, panels: &PanelStore, gate: &PanelGate) {
    for (guild_id, record) in panels.all() {
        let Some(message_id) = record.embed_message_id else {
            continue;
        };

        match render_panel(http, &record, message_id, gate.status(guild_id)).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(
                "Panel message for guild {} is gone; leaving record as-is",
                guild_id
            ),
            Err(e) => tracing::error!("Failed to resync panel for guild {}: {}", guild_id, e),
        }
    }
}

/// Publishes a fresh panel message and persists the guild's config and
/// panel record. Nothing is persisted when the send fails.
pub async fn install_panel(
    http: &Arc<Http>,
    configs: &GuildConfigStore,
    panels: &PanelStore,
    gate: &PanelGate,
    setup: PanelSetup,
) -> Result<(), AppError> {
    let embed = build_panel_embed(&setup);
    let message = setup
        .embed_channel_id
        .send_message(
            http,
            CreateMessage::new()
                .embed(embed.clone())
                .components(panel_components(gate.status(setup.guild_id))),
        )
        .await?;

    configs
        .upsert(
            setup.guild_id,
            GuildConfig {
                log_channel_id: setup.log_channel_id,
                role_id: setup.role_id,
            },
        )
        .await?;
    panels
        .upsert(
            setup.guild_id,
            PanelRecord {
                embed_channel_id: setup.embed_channel_id,
                embed: serde_json::to_value(&embed)?,
                embed_message_id: Some(message.id),
            },
        )
        .await?;

    Ok(())
}

/// Sets a guild's gate status, then re-renders its panel message.
///
/// The render is best-effort: a failure is logged and never rolls back the
/// status change.
pub async fn toggle_panel(
    http: &Arc<Http>,
    panels: &PanelStore,
    gate: &PanelGate,
    guild_id: GuildId,
    status: PanelStatus,
) {
    gate.set_status(guild_id, status);

    let Some(record) = panels.get(guild_id) else {
        return;
    };
    let Some(message_id) = record.embed_message_id else {
        return;
    };

    match render_panel(http, &record, message_id, status).await {
        Ok(true) => {}
        Ok(false) => tracing::debug!(
            "Panel message for guild {} is gone; status change stands",
            guild_id
        ),
        Err(e) => tracing::error!("Failed to re-render panel for guild {}: {}", guild_id, e),
    }
}
