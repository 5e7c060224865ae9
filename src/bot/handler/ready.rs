use serenity::all::{
    ActivityData, Command, CommandOptionType, Context, CreateCommand, CreateCommandOption, Ready,
};

use crate::service::panel;
use crate::state::AppState;

/// Handle the gateway ready event: presence, global command registration,
/// and the startup panel resync.
pub async fn handle_ready(state: &AppState, ctx: Context, ready: Ready) {
    tracing::info!("{} is connected to Discord!", ready.user.name);

    ctx.set_activity(Some(ActivityData::custom("Taking applications")));

    match Command::set_global_commands(&ctx.http, commands()).await {
        Ok(_) => tracing::info!("Global commands registered successfully"),
        Err(e) => tracing::error!("Error while registering global commands: {}", e),
    }

    panel::resync_all(&ctx.http, &state.panels, &state.gate).await;
}

fn commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("setup")
            .description("Setup the application system")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Channel,
                    "log_channel",
                    "The channel where application logs will be sent",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Channel,
                    "embed_channel",
                    "The channel where the application embed will be sent",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Role,
                    "role",
                    "The role to assign on successful application",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "embed_color",
                    "The color of the application embed (in hex)",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "footer_text",
                    "The footer text for the embed",
                )
                .required(true),
            )
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "footer_icon",
                "The URL for the footer icon image",
            ))
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "thumbnail_image",
                "The URL for the thumbnail image",
            ))
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "lower_image",
                "The URL for the lower image",
            )),
        CreateCommand::new("togglepanel")
            .description("Open or close the application panel for submissions")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "status",
                    "Set the panel status (open/close)",
                )
                .required(true)
                .add_string_choice("Open", "open")
                .add_string_choice("Close", "close"),
            ),
    ]
}
