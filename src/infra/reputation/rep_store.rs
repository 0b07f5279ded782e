use crate::core::reputation::{RepError, RepStore, RepUser};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

/// SQLite-backed reputation counts, composite-keyed on (user, guild).
pub struct SqliteRepStore {
    pool: Pool<Sqlite>,
}

impl SqliteRepStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
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

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rep_user (
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, guild_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RepStore for SqliteRepStore {
    async fn get_count(&self, user_id: u64, guild_id: u64) -> Result<i64, RepError> {
        let row = sqlx::query("SELECT count FROM rep_user WHERE user_id = ? AND guild_id = ?")
            .bind(user_id as i64)
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepError::Storage(e.to_string()))?;

        Ok(row.map(|row| row.get::<i64, _>(0)).unwrap_or(0))
    }

    async fn increment(&self, user_id: u64, guild_id: u64) -> Result<i64, RepError> {
        let row = sqlx::query(
            r#"
            INSERT INTO rep_user (user_id, guild_id, count)
            VALUES (?, ?, 1)
            ON CONFLICT(user_id, guild_id) DO UPDATE SET count = count + 1
            RETURNING count
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepError::Storage(e.to_string()))?;

        Ok(row.get::<i64, _>(0))
    }

    async fn top(&self, guild_id: u64, limit: usize) -> Result<Vec<RepUser>, RepError> {
        let rows = sqlx::query(
            "SELECT user_id, count FROM rep_user WHERE guild_id = ? ORDER BY count DESC LIMIT ?",
        )
        .bind(guild_id as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepError::Storage(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| RepUser {
                user_id: row.get::<i64, _>("user_id") as u64,
                guild_id,
                count: row.get("count"),
            })
            .collect())
    }
}
