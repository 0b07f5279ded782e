use crate::core::reminders::{NewReminder, Reminder, ReminderError, ReminderStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteReminderStore {
    pool: Pool<Sqlite>,
}

impl SqliteReminderStore {
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
            CREATE TABLE IF NOT EXISTS remind (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guild_id INTEGER NOT NULL,
                channel_id INTEGER,
                user_id INTEGER NOT NULL,
                made_on TEXT NOT NULL,
                remind_on TEXT NOT NULL,
                message TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_remind_due ON remind(remind_on);")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_remind_user ON remind(user_id);")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ReminderStore for SqliteReminderStore {
    async fn insert(&self, reminder: NewReminder) -> Result<i64, ReminderError> {
        let result = sqlx::query(
            r#"
            INSERT INTO remind (guild_id, channel_id, user_id, made_on, remind_on, message)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reminder.guild_id as i64)
        .bind(reminder.channel_id.map(|id| id as i64))
        .bind(reminder.user_id as i64)
        .bind(reminder.made_on)
        .bind(reminder.remind_on)
        .bind(reminder.message)
        .execute(&self.pool)
        .await
        .map_err(|e| ReminderError::Storage(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn count_for_user(&self, user_id: u64) -> Result<usize, ReminderError> {
        let row = sqlx::query("SELECT COUNT(id) FROM remind WHERE user_id = ?")
            .bind(user_id as i64)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ReminderError::Storage(e.to_string()))?;

        Ok(row.get::<i64, _>(0) as usize)
    }

    async fn list_for_user(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Vec<Reminder>, ReminderError> {
        let rows =
            sqlx::query("SELECT * FROM remind WHERE guild_id = ? AND user_id = ? ORDER BY id DESC")
                .bind(guild_id as i64)
                .bind(user_id as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| ReminderError::Storage(e.to_string()))?;

        Ok(rows.iter().map(row_to_reminder).collect())
    }

    async fn due_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Reminder>, ReminderError> {
        let rows = sqlx::query("SELECT * FROM remind WHERE remind_on <= ? ORDER BY id")
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ReminderError::Storage(e.to_string()))?;

        Ok(rows.iter().map(row_to_reminder).collect())
    }

    async fn delete(&self, id: i64) -> Result<bool, ReminderError> {
        let result = sqlx::query("DELETE FROM remind WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ReminderError::Storage(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_owned(
        &self,
        id: i64,
        guild_id: u64,
        user_id: u64,
    ) -> Result<bool, ReminderError> {
        let result = sqlx::query("DELETE FROM remind WHERE id = ? AND guild_id = ? AND user_id = ?")
            .bind(id)
            .bind(guild_id as i64)
            .bind(user_id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| ReminderError::Storage(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_reminder(row: &sqlx::sqlite::SqliteRow) -> Reminder {
    Reminder {
        id: row.get("id"),
        guild_id: row.get::<i64, _>("guild_id") as u64,
        channel_id: row.get::<Option<i64>, _>("channel_id").map(|id| id as u64),
        user_id: row.get::<i64, _>("user_id") as u64,
        made_on: row.get("made_on"),
        remind_on: row.get("remind_on"),
        message: row.get("message"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn memory_store() -> SqliteReminderStore {
        SqliteReminderStore::new("sqlite::memory:").await.unwrap()
    }

    fn new_reminder(guild_id: u64, user_id: u64, due_in_secs: i64) -> NewReminder {
        let now = Utc::now();
        NewReminder {
            guild_id,
            channel_id: Some(10),
            user_id,
            made_on: now,
            remind_on: now + Duration::seconds(due_in_secs),
            message: Some("water the plants".to_string()),
        }
    }

    #[tokio::test]
    async fn insert_then_list_round_trips_all_fields() {
        let store = memory_store().await;
        let now = Utc::now();

        let id = store
            .insert(NewReminder {
                guild_id: 1,
                channel_id: None,
                user_id: 100,
                made_on: now,
                remind_on: now + Duration::hours(2),
                message: None,
            })
            .await
            .unwrap();

        let listed = store.list_for_user(1, 100).await.unwrap();
        assert_eq!(listed.len(), 1);
        let reminder = &listed[0];
        assert_eq!(reminder.id, id);
        assert_eq!(reminder.guild_id, 1);
        assert_eq!(reminder.channel_id, None);
        assert_eq!(reminder.user_id, 100);
        assert_eq!(reminder.message, None);
        assert!((reminder.remind_on - reminder.made_on - Duration::hours(2)).num_seconds() == 0);
    }

    #[tokio::test]
    async fn list_is_newest_id_first() {
        let store = memory_store().await;

        let a = store.insert(new_reminder(1, 100, 60)).await.unwrap();
        let b = store.insert(new_reminder(1, 100, 120)).await.unwrap();
        store.insert(new_reminder(2, 100, 60)).await.unwrap();

        let ids: Vec<i64> = store
            .list_for_user(1, 100)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[tokio::test]
    async fn count_spans_guilds_for_one_user() {
        let store = memory_store().await;

        store.insert(new_reminder(1, 100, 60)).await.unwrap();
        store.insert(new_reminder(2, 100, 60)).await.unwrap();
        store.insert(new_reminder(1, 200, 60)).await.unwrap();

        assert_eq!(store.count_for_user(100).await.unwrap(), 2);
        assert_eq!(store.count_for_user(200).await.unwrap(), 1);
        assert_eq!(store.count_for_user(300).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn due_before_selects_only_past_due_rows() {
        let store = memory_store().await;

        let due = store.insert(new_reminder(1, 100, -30)).await.unwrap();
        store.insert(new_reminder(1, 100, 3_600)).await.unwrap();

        let snapshot = store.due_before(Utc::now()).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, due);
    }

    #[tokio::test]
    async fn deletes_are_idempotent_and_ownership_checked() {
        let store = memory_store().await;
        let id = store.insert(new_reminder(1, 100, 60)).await.unwrap();

        assert!(!store.delete_owned(id, 1, 999).await.unwrap());
        assert!(!store.delete_owned(id, 9, 100).await.unwrap());

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(!store.delete_owned(id, 1, 100).await.unwrap());
    }

    #[tokio::test]
    async fn file_backed_store_creates_its_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.db");
        let url = path.to_string_lossy().to_string();

        let store = SqliteReminderStore::new(&url).await.unwrap();
        let id = store.insert(new_reminder(1, 100, 60)).await.unwrap();
        assert_eq!(store.list_for_user(1, 100).await.unwrap()[0].id, id);
        assert!(path.exists());
    }
}
