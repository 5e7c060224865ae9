use serenity::all::UserId;

use crate::error::{config::ConfigError, AppError};

pub struct Config {
    pub discord_bot_token: String,

    /// The only user allowed to run `/setup`.
    pub bot_owner_id: UserId,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let discord_bot_token = std::env::var("DISCORD_BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("DISCORD_BOT_TOKEN".to_string()))?;

        let owner_raw = std::env::var("BOT_OWNER_ID")
            .map_err(|_| ConfigError::MissingEnvVar("BOT_OWNER_ID".to_string()))?;
        let owner_id: u64 = owner_raw
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("BOT_OWNER_ID".to_string()))?;
        if owner_id == 0 {
            return Err(ConfigError::InvalidEnvVar("BOT_OWNER_ID".to_string()).into());
        }

        Ok(Self {
            discord_bot_token,
            bot_owner_id: UserId::new(owner_id),
        })
    }
}
