use serenity::all::{Context, EventHandler, Interaction, Message, Ready, UserId};
use serenity::async_trait;

use crate::state::AppState;

pub mod interaction;
pub mod message;
pub mod ready;

/// Discord bot event handler
pub struct Handler {
    state: AppState,
    owner_id: UserId,
}

impl Handler {
    pub fn new(state: AppState, owner_id: UserId) -> Self {
        Self { state, owner_id }
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready and connected to Discord
    async fn ready(&self, ctx: Context, ready: Ready) {
        ready::handle_ready(&self.state, ctx, ready).await;
    }

    /// Called for every inbound message; DM replies feed waiting sessions
    async fn message(&self, ctx: Context, message: Message) {
        message::handle_message(&self.state, ctx, message).await;
    }

    /// Called for slash commands and the panel button
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        interaction::handle_interaction(&self.state, self.owner_id, ctx, interaction).await;
    }
}
