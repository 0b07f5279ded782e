use super::logging_models::{LogConfig, TrackedMessage};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

// Cap how many message snapshots we keep so the cache can't grow unbounded.
const MAX_TRACKED_MESSAGES: usize = 5_000;

/// Persistence for the per-guild logger configuration.
#[async_trait]
pub trait LogConfigStore: Send + Sync {
    async fn get_config(&self, guild_id: u64) -> Result<Option<LogConfig>>;
    async fn save_config(&self, config: LogConfig) -> Result<()>;
}

pub struct LoggingService<S: LogConfigStore> {
    store: S,
    // Message ID -> snapshot, for logging deletions after cache eviction.
    message_cache: DashMap<u64, TrackedMessage>,
}

impl<S: LogConfigStore> LoggingService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            message_cache: DashMap::new(),
        }
    }

    pub async fn get_config(&self, guild_id: u64) -> Result<Option<LogConfig>> {
        self.store.get_config(guild_id).await
    }

    /// Where log embeds for this guild should go, or None when logging is
    /// unconfigured, disabled, or has no channel set.
    pub async fn log_target(&self, guild_id: u64) -> Result<Option<u64>> {
        Ok(self
            .store
            .get_config(guild_id)
            .await?
            .filter(|config| config.enabled)
            .and_then(|config| config.channel_id))
    }

    /// Pointing the logger at a channel also turns it on.
    pub async fn set_log_channel(&self, guild_id: u64, channel_id: u64) -> Result<()> {
        self.store
            .save_config(LogConfig {
                guild_id,
                enabled: true,
                channel_id: Some(channel_id),
            })
            .await
    }

    /// Returns false when there is nothing to toggle yet (no config, or
    /// enabling without a channel set).
    pub async fn set_enabled(&self, guild_id: u64, enabled: bool) -> Result<bool> {
        let Some(mut config) = self.store.get_config(guild_id).await? else {
            return Ok(false);
        };
        if enabled && config.channel_id.is_none() {
            return Ok(false);
        }
        config.enabled = enabled;
        self.store.save_config(config).await?;
        Ok(true)
    }

    /// Store a message snapshot so a later deletion can still be logged.
    pub fn remember_message(&self, message: TrackedMessage) {
        self.message_cache.insert(message.message_id, message);

        // Simple eviction: drop an arbitrary entry once we cross the cap.
        if self.message_cache.len() > MAX_TRACKED_MESSAGES {
            // Bind the key first so the iterator's shard guard is dropped
            // before `remove` takes a write lock on the same shard.
            let first_key = self.message_cache.iter().next().map(|entry| *entry.key());
            if let Some(first_key) = first_key {
                self.message_cache.remove(&first_key);
            }
        }
    }

    /// Remove and return a tracked message (used on deletion).
    pub fn take_tracked_message(&self, message_id: u64) -> Option<TrackedMessage> {
        self.message_cache.remove(&message_id).map(|(_, msg)| msg)
    }
}
