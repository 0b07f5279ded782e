// Reputation points per (user, guild), with a short in-memory cooldown
// between grants from the same giver. Platform-agnostic like the other
// core services: the discord layer handles mentions and emoji flavor.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How long a giver has to wait between reps in the same guild.
pub const REP_COOLDOWN: Duration = Duration::from_secs(5);

/// `replist` result sizes are clamped into this range.
pub const REPLIST_MIN: usize = 3;
pub const REPLIST_MAX: usize = 20;

// Once the cooldown map outgrows this, expired entries are pruned before
// the next insert, so the map can't grow without bound.
const COOLDOWN_MAP_CAP: usize = 1_024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepUser {
    pub user_id: u64,
    pub guild_id: u64,
    pub count: i64,
}

#[derive(Debug, Error)]
pub enum RepError {
    #[error("You can't rep yourself.")]
    SelfRep,

    #[error("You have to wait {0} more seconds until you can rep again.")]
    OnCooldown(u64),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RepError {
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, RepError::Storage(_))
    }
}

#[async_trait]
pub trait RepStore: Send + Sync {
    /// Current count, 0 for users never repped.
    async fn get_count(&self, user_id: u64, guild_id: u64) -> Result<i64, RepError>;

    /// Add one, creating the row on first rep. Returns the new count.
    async fn increment(&self, user_id: u64, guild_id: u64) -> Result<i64, RepError>;

    /// Top users in a guild by count, descending.
    async fn top(&self, guild_id: u64, limit: usize) -> Result<Vec<RepUser>, RepError>;
}

pub struct ReputationService<S: RepStore> {
    store: S,
    cooldown: Duration,
    // (guild_id, giver_id) -> last grant.
    last_given: DashMap<(u64, u64), Instant>,
}

impl<S: RepStore> ReputationService<S> {
    pub fn new(store: S) -> Self {
        Self::with_cooldown(store, REP_COOLDOWN)
    }

    fn with_cooldown(store: S, cooldown: Duration) -> Self {
        Self {
            store,
            cooldown,
            last_given: DashMap::new(),
        }
    }

    pub async fn get_count(&self, user_id: u64, guild_id: u64) -> Result<i64, RepError> {
        self.store.get_count(user_id, guild_id).await
    }

    /// Grant one reputation point. The cooldown is keyed on the giver, so
    /// a user can't spray points across a guild; receiving is unlimited.
    pub async fn give(
        &self,
        guild_id: u64,
        giver_id: u64,
        receiver_id: u64,
    ) -> Result<i64, RepError> {
        if giver_id == receiver_id {
            return Err(RepError::SelfRep);
        }

        if let Some(last) = self.last_given.get(&(guild_id, giver_id)) {
            let elapsed = last.elapsed();
            if elapsed < self.cooldown {
                let remaining = (self.cooldown - elapsed).as_secs().max(1);
                return Err(RepError::OnCooldown(remaining));
            }
        }

        let count = self.store.increment(receiver_id, guild_id).await?;
        self.note_given(guild_id, giver_id);
        Ok(count)
    }

    fn note_given(&self, guild_id: u64, giver_id: u64) {
        if self.last_given.len() >= COOLDOWN_MAP_CAP {
            let cooldown = self.cooldown;
            self.last_given.retain(|_, last| last.elapsed() < cooldown);
        }
        self.last_given.insert((guild_id, giver_id), Instant::now());
    }

    /// Leaderboard, with the requested size clamped to a sane range.
    pub async fn top(&self, guild_id: u64, amount: usize) -> Result<Vec<RepUser>, RepError> {
        let limit = amount.clamp(REPLIST_MIN, REPLIST_MAX);
        self.store.top(guild_id, limit).await
    }
}
