//! Store for per-guild panel records.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use serenity::all::GuildId;
use tokio::fs;

use crate::error::AppError;
use crate::model::PanelRecord;

/// JSON-file-backed mapping of guild id to [`PanelRecord`].
///
/// The resync job only reads; `/setup` is the sole writer. A record's
/// `embed_message_id` may point at a message that no longer exists; the
/// store never edits a record on behalf of a failed fetch.
pub struct PanelStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<GuildId, PanelRecord>>,
}

impl PanelStore {
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

    pub fn get(&self, guild_id: GuildId) -> Option<PanelRecord> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&guild_id)
            .cloned()
    }

    /// Snapshot of every guild's panel record, for the resync batch.
    pub fn all(&self) -> Vec<(GuildId, PanelRecord)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(guild_id, record)| (*guild_id, record.clone()))
            .collect()
    }

    /// Inserts or replaces a guild's panel record and rewrites the backing file.
    pub async fn upsert(&self, guild_id: GuildId, record: PanelRecord) -> Result<(), AppError> {
        let snapshot = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.insert(guild_id, record);
            serde_json::to_string_pretty(&*entries)?
        };
        fs::write(&self.path, snapshot).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::all::{ChannelId, MessageId};
    use tempfile::TempDir;

    fn sample_record() -> PanelRecord {
        PanelRecord {
            embed_channel_id: ChannelId::new(200),
            embed: serde_json::json!({"title": "Application Panel"}),
            embed_message_id: Some(MessageId::new(900)),
        }
    }

    #[tokio::test]
    async fn round_trips_records() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("embed.json");

        let store = PanelStore::load(&path).await.unwrap();
        store.upsert(GuildId::new(1), sample_record()).await.unwrap();

        let reloaded = PanelStore::load(&path).await.unwrap();
        assert_eq!(reloaded.get(GuildId::new(1)), Some(sample_record()));
        assert_eq!(reloaded.all().len(), 1);
    }

    #[tokio::test]
    async fn file_format_matches_original_deployment() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("embed.json");

        let store = PanelStore::load(&path).await.unwrap();
        store.upsert(GuildId::new(1), sample_record()).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["1"]["embedChannelId"], "200");
        assert_eq!(raw["1"]["embedMessageId"], "900");
        assert_eq!(raw["1"]["embed"]["title"], "Application Panel");
    }
}
