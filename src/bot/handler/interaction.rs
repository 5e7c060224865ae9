use std::sync::Arc;

use serenity::all::{
    CommandInteraction, ComponentInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, Interaction, ResolvedValue, UserId,
};

use crate::model::PanelStatus;
use crate::service::{intake, outbound::DiscordOutbound, panel};
use crate::state::AppState;

/// Dispatches slash commands and panel button presses.
pub async fn handle_interaction(
    state: &AppState,
    owner_id: UserId,
    ctx: Context,
    interaction: Interaction,
) {
    match interaction {
        Interaction::Command(command) => match command.data.name.as_str() {
            "setup" => handle_setup(state, owner_id, &ctx, &command).await,
            "togglepanel" => handle_toggle_panel(state, &ctx, &command).await,
            _ => {}
        },
        Interaction::Component(component)
            if component.data.custom_id == panel::APPLY_BUTTON_ID =>
        {
            handle_apply(state, &ctx, &component).await;
        }
        _ => {}
    }
}

/// `/setup`: publish the panel and persist the guild's config and record.
async fn handle_setup(
    state: &AppState,
    owner_id: UserId,
    ctx: &Context,
    command: &CommandInteraction,
) {
    if command.user.id != owner_id {
        respond(ctx, command, "You do not have permission to use this command.", true).await;
        return;
    }
    let Some(guild_id) = command.guild_id else {
        respond(ctx, command, "This command can only be used in a server.", true).await;
        return;
    };

    let mut log_channel = None;
    let mut embed_channel = None;
    let mut role = None;
    let mut embed_color = None;
    let mut footer_text = None;
    let mut footer_icon = None;
    let mut thumbnail = None;
    let mut image = None;

    for option in command.data.options() {
        match (option.name, option.value) {
            ("log_channel", ResolvedValue::Channel(channel)) => log_channel = Some(channel.id),
            ("embed_channel", ResolvedValue::Channel(channel)) => embed_channel = Some(channel.id),
            ("role", ResolvedValue::Role(resolved)) => role = Some(resolved.id),
            ("embed_color", ResolvedValue::String(value)) => embed_color = Some(value.to_string()),
            ("footer_text", ResolvedValue::String(value)) => footer_text = Some(value.to_string()),
            ("footer_icon", ResolvedValue::String(value)) => footer_icon = Some(value.to_string()),
            ("thumbnail_image", ResolvedValue::String(value)) => {
                thumbnail = Some(value.to_string())
            }
            ("lower_image", ResolvedValue::String(value)) => image = Some(value.to_string()),
            _ => {}
        }
    }

    let (
        Some(log_channel_id),
        Some(embed_channel_id),
        Some(role_id),
        Some(embed_color),
        Some(footer_text),
    ) = (log_channel, embed_channel, role, embed_color, footer_text)
    else {
        respond(
            ctx,
            command,
            "Invalid input, please provide all required options.",
            true,
        )
        .await;
        return;
    };

    let Some(color) = panel::parse_embed_color(&embed_color) else {
        respond(
            ctx,
            command,
            "Invalid embed color, please provide a hex value like #3498db.",
            true,
        )
        .await;
        return;
    };

    let bot_avatar = ctx.cache.current_user().face();
    let setup = panel::PanelSetup {
        guild_id,
        log_channel_id,
        embed_channel_id,
        role_id,
        color,
        footer_text,
        footer_icon: footer_icon.unwrap_or_else(|| bot_avatar.clone()),
        thumbnail: thumbnail.unwrap_or(bot_avatar),
        image,
    };

    match panel::install_panel(&ctx.http, &state.configs, &state.panels, &state.gate, setup).await
    {
        Ok(()) => respond(ctx, command, "Application system set up successfully!", false).await,
        Err(e) => {
            tracing::error!(
                "Failed to set up the application panel for guild {}: {}",
                guild_id,
                e
            );
            respond(
                ctx,
                command,
                "Failed to send embed. Please check permissions.",
                true,
            )
            .await;
        }
    }
}

/// `/togglepanel`: flip the gate and re-render the panel button.
async fn handle_toggle_panel(state: &AppState, ctx: &Context, command: &CommandInteraction) {
    let Some(guild_id) = command.guild_id else {
        respond(ctx, command, "This command can only be used in a server.", true).await;
        return;
    };

    let mut status_raw = None;
    for option in command.data.options() {
        if let ("status", ResolvedValue::String(value)) = (option.name, option.value) {
            status_raw = Some(value.to_string());
        }
    }

    let status = match status_raw.as_deref().map(str::parse::<PanelStatus>) {
        Some(Ok(status)) => status,
        _ => {
            respond(
                ctx,
                command,
                "Invalid status. Please choose \"open\" or \"close\".",
                true,
            )
            .await;
            return;
        }
    };

    panel::toggle_panel(&ctx.http, &state.panels, &state.gate, guild_id, status).await;

    respond(
        ctx,
        command,
        &format!("The application panel has been {}.", status),
        false,
    )
    .await;
}

/// The panel button: admit a new application session and run it out of band.
async fn handle_apply(state: &AppState, ctx: &Context, component: &ComponentInteraction) {
    let Some(guild_id) = component.guild_id else {
        respond_component(ctx, component, "This button can only be used in a server.", true).await;
        return;
    };
    let user_id = component.user.id;

    let outbound = Arc::new(DiscordOutbound::new(ctx.http.clone()));
    match intake::begin(state, outbound, guild_id, user_id).await {
        Ok(session) => {
            respond_component(
                ctx,
                component,
                "Check your DMs to continue your application.",
                true,
            )
            .await;

            tokio::spawn(async move {
                match session.run().await {
                    Ok(outcome) => tracing::info!(
                        "Application session for user {} ended: {:?}",
                        user_id,
                        outcome
                    ),
                    Err(e) => {
                        tracing::warn!("Application session for user {} failed: {}", user_id, e)
                    }
                }
            });
        }
        Err(e) => {
            tracing::debug!(
                "Rejected application start for user {} in guild {}: {}",
                user_id,
                guild_id,
                e
            );
            respond_component(ctx, component, e.user_message(), true).await;
        }
    }
}

async fn respond(ctx: &Context, command: &CommandInteraction, content: &str, ephemeral: bool) {
    let message = CreateInteractionResponseMessage::new()
        .content(content)
        .ephemeral(ephemeral);
    if let Err(e) = command
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await
    {
        tracing::error!("Failed to respond to interaction: {}", e);
    }
}

async fn respond_component(
    ctx: &Context,
    component: &ComponentInteraction,
    content: &str,
    ephemeral: bool,
) {
    let message = CreateInteractionResponseMessage::new()
        .content(content)
        .ephemeral(ephemeral);
    if let Err(e) = component
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await
    {
        tracing::error!("Failed to respond to interaction: {}", e);
    }
}
