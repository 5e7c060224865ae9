use crate::data::{GuildConfigStore, PanelStore, QuestionSet};
use crate::error::AppError;

/// Per-guild log channel and role configuration.
pub const GUILD_CONFIG_FILE: &str = "config.json";
/// Per-guild panel records (embed snapshot and message id).
pub const PANEL_FILE: &str = "embed.json";
/// The shared application question set.
pub const QUESTIONS_FILE: &str = "questions.json";

/// Loads the persisted record files from the working directory.
///
/// The file names and formats match the original deployment, so existing
/// data files are picked up unchanged. Missing files yield empty stores, as
/// on a fresh deployment.
pub async fn load_stores() -> Result<(GuildConfigStore, PanelStore, QuestionSet), AppError> {
    let configs = GuildConfigStore::load(GUILD_CONFIG_FILE).await?;
    let panels = PanelStore::load(PANEL_FILE).await?;
    let questions = QuestionSet::load(QUESTIONS_FILE).await?;

    Ok((configs, panels, questions))
}
