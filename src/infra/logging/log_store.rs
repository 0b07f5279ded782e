use crate::core::logging::{LogConfig, LogConfigStore};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

/// SQLite-backed log configuration, one row per guild.
pub struct SqliteLogStore {
    pool: Pool<Sqlite>,
}

impl SqliteLogStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS log_guild (
                guild_id INTEGER PRIMARY KEY,
                enabled BOOLEAN NOT NULL DEFAULT 0,
                channel_id INTEGER
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl LogConfigStore for SqliteLogStore {
    async fn get_config(&self, guild_id: u64) -> Result<Option<LogConfig>> {
        let row = sqlx::query("SELECT enabled, channel_id FROM log_guild WHERE guild_id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| LogConfig {
            guild_id,
            enabled: row.get("enabled"),
            channel_id: row.get::<Option<i64>, _>("channel_id").map(|id| id as u64),
        }))
    }

    async fn save_config(&self, config: LogConfig) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO log_guild (guild_id, enabled, channel_id)
            VALUES (?, ?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET
                enabled = excluded.enabled,
                channel_id = excluded.channel_id
            "#,
        )
        .bind(config.guild_id as i64)
        .bind(config.enabled)
        .bind(config.channel_id.map(|id| id as i64))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_guild_has_no_config() {
        let store = SqliteLogStore::new("sqlite::memory:").await.unwrap();
        assert!(store.get_config(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_get_round_trips_and_upserts() {
        let store = SqliteLogStore::new("sqlite::memory:").await.unwrap();

        let config = LogConfig {
            guild_id: 1,
            enabled: true,
            channel_id: Some(42),
        };
        store.save_config(config.clone()).await.unwrap();
        assert_eq!(store.get_config(1).await.unwrap(), Some(config));

        let updated = LogConfig {
            guild_id: 1,
            enabled: false,
            channel_id: None,
        };
        store.save_config(updated.clone()).await.unwrap();
        assert_eq!(store.get_config(1).await.unwrap(), Some(updated));
    }
}
