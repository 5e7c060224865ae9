use serenity::all::{Context, Message};

use crate::state::AppState;

/// Routes direct-message replies to the session waiting on them.
pub async fn handle_message(state: &AppState, _ctx: Context, message: Message) {
    // Only direct messages participate in the question/answer exchange
    if message.guild_id.is_some() || message.author.bot {
        return;
    }

    if state.router.resolve(message.author.id, message.content) {
        tracing::debug!("Recorded an answer from user {}", message.author.id);
    }
}
