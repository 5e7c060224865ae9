//! Store for per-guild application configuration.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use serenity::all::GuildId;
use tokio::fs;

use crate::error::AppError;
use crate::model::GuildConfig;

/// JSON-file-backed mapping of guild id to [`GuildConfig`].
///
/// Mutated only by the `/setup` command; read by every concurrent session.
/// Reads are served from memory, writes rewrite the backing file.
pub struct GuildConfigStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<GuildId, GuildConfig>>,
}

impl GuildConfigStore {
    /// Loads the store from `path`. A missing file yields an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn get(&self, guild_id: GuildId) -> Option<GuildConfig> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&guild_id)
            .cloned()
    }

    /// Inserts or replaces a guild's config and rewrites the backing file.
    pub async fn upsert(&self, guild_id: GuildId, config: GuildConfig) -> Result<(), AppError> {
        let snapshot = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.insert(guild_id, config);
            serde_json::to_string_pretty(&*entries)?
        };
        fs::write(&self.path, snapshot).await?;

        Ok(())
    }
}
