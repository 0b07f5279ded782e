// In-memory implementation of ReminderStore.
//
// Backs the service and scheduler tests, and is handy for running the bot
// without a durable database. Ids are never reused, matching the
// autoincrement behavior of the SQLite store.

use crate::core::reminders::{NewReminder, Reminder, ReminderError, ReminderStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

pub struct InMemoryReminderStore {
    rows: DashMap<i64, Reminder>,
    next_id: AtomicI64,
}

impl InMemoryReminderStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryReminderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReminderStore for InMemoryReminderStore {
    async fn insert(&self, reminder: NewReminder) -> Result<i64, ReminderError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.insert(
            id,
            Reminder {
                id,
                guild_id: reminder.guild_id,
                channel_id: reminder.channel_id,
                user_id: reminder.user_id,
                made_on: reminder.made_on,
                remind_on: reminder.remind_on,
                message: reminder.message,
            },
        );
        Ok(id)
    }

    async fn count_for_user(&self, user_id: u64) -> Result<usize, ReminderError> {
        Ok(self
            .rows
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .count())
    }

    async fn list_for_user(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Vec<Reminder>, ReminderError> {
        let mut rows: Vec<Reminder> = self
            .rows
            .iter()
            .filter(|entry| entry.guild_id == guild_id && entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn due_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Reminder>, ReminderError> {
        let mut rows: Vec<Reminder> = self
            .rows
            .iter()
            .filter(|entry| entry.remind_on <= cutoff)
            .map(|entry| entry.clone())
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn delete(&self, id: i64) -> Result<bool, ReminderError> {
        Ok(self.rows.remove(&id).is_some())
    }

    async fn delete_owned(
        &self,
        id: i64,
        guild_id: u64,
        user_id: u64,
    ) -> Result<bool, ReminderError> {
        // remove_if makes the ownership check and the removal one atomic step.
        Ok(self
            .rows
            .remove_if(&id, |_, r| r.guild_id == guild_id && r.user_id == user_id)
            .is_some())
    }
}
