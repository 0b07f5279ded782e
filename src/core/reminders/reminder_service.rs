// This is the reminder module - it contains the business logic for creating,
// listing and deleting reminders. Notice how this module has NO Discord-specific
// code (no serenity, no poise imports). It works with primitive types
// (u64, i64, String) so the scheduler and the command layer can both drive it.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// The most reminders a single user may own at once, across guilds.
/// Enforced at creation, never retroactively.
pub const MAX_REMINDERS: usize = 12;

/// A reminder may not be scheduled further out than this.
pub const MAX_DELTA_DAYS: i64 = 365;

/// Upper bound on the user-supplied message body.
pub const MAX_MESSAGE_LEN: usize = 1024;

/// Substituted at render time when a reminder has no message.
/// Never written to the store.
pub const DEFAULT_REMINDER_MESSAGE: &str = "Hey, wake up!";

/// Below this many seconds until due, the countdown renders as "Soon...".
pub const SOON_THRESHOLD_SECS: i64 = 15;

/// Page size for the reminder list command.
pub const REMINDERS_PER_PAGE: usize = 6;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// One pending reminder. Immutable once created - the only mutation path
/// that exists is deletion (by the scheduler after dispatch, or by the owner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: i64,
    pub guild_id: u64,
    /// Channel the reminder was created in, preferred delivery target.
    pub channel_id: Option<u64>,
    pub user_id: u64,
    pub made_on: DateTime<Utc>,
    pub remind_on: DateTime<Utc>,
    pub message: Option<String>,
}

impl Reminder {
    /// Body shown to the user. The default text is substituted here,
    /// at render time, not at storage time.
    pub fn body(&self) -> &str {
        self.message.as_deref().unwrap_or(DEFAULT_REMINDER_MESSAGE)
    }
}

/// Insert payload; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub guild_id: u64,
    pub channel_id: Option<u64>,
    pub user_id: u64,
    pub made_on: DateTime<Utc>,
    pub remind_on: DateTime<Utc>,
    pub message: Option<String>,
}

/// Lightweight acknowledgment returned on create. The command layer only
/// needs the id and due time to confirm, so we skip the full row round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderAck {
    pub id: i64,
    pub remind_on: DateTime<Utc>,
}

/// Time units accepted by the create command, with their aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    /// Case-insensitive alias lookup: "m", "hrs", "Weeks" etc. all resolve.
    pub fn parse(unit: &str) -> Option<TimeUnit> {
        match unit.to_ascii_lowercase().as_str() {
            "m" | "min" | "mins" | "minute" | "minutes" => Some(TimeUnit::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(TimeUnit::Hours),
            "d" | "day" | "days" => Some(TimeUnit::Days),
            "w" | "wk" | "week" | "weeks" => Some(TimeUnit::Weeks),
            _ => None,
        }
    }

    pub fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Days => 86_400.0,
            TimeUnit::Weeks => 604_800.0,
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================
// Validation and not-found variants carry the exact text shown to the
// invoking user. Storage faults never reach users verbatim.

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Unknown time type.")]
    UnknownUnit,

    #[error("Unit has to be more than 0.")]
    NonPositiveAmount,

    #[error("Sorry. Can't remind in more than a year!")]
    TooFarAhead,

    #[error("Sorry, keep the message below {MAX_MESSAGE_LEN} characters!")]
    MessageTooLong,

    #[error("Sorry, you can't have more than {MAX_REMINDERS} active reminders at once.")]
    QuotaExceeded,

    #[error("Reminder not found, or you do not own it.")]
    NotFound,

    #[error("Couldn't find any reminders.")]
    NoReminders,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ReminderError {
    /// Whether the Display text is meant for the invoking user.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, ReminderError::Storage(_))
    }
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Durable reminder table. The scheduler and the command surface are the
/// only consumers; row-level atomicity of insert/delete is all the
/// consistency the service relies on.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Insert a reminder and return its assigned id.
    async fn insert(&self, reminder: NewReminder) -> Result<i64, ReminderError>;

    /// How many reminders a user currently owns, across guilds (quota check).
    async fn count_for_user(&self, user_id: u64) -> Result<usize, ReminderError>;

    /// All of a user's reminders in a guild, newest id first.
    async fn list_for_user(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Vec<Reminder>, ReminderError>;

    /// Every reminder whose due time is at or before the cutoff.
    async fn due_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Reminder>, ReminderError>;

    /// Delete by id. Returns whether a row was removed; deleting an id that
    /// is already gone is a no-op, not an error.
    async fn delete(&self, id: i64) -> Result<bool, ReminderError>;

    /// Ownership-checked delete: removes the row only when id, guild and
    /// user all match. Returns whether a row was removed.
    async fn delete_owned(
        &self,
        id: i64,
        guild_id: u64,
        user_id: u64,
    ) -> Result<bool, ReminderError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Validates and executes the reminder operations against the injected store.
pub struct ReminderService<S: ReminderStore> {
    store: S,
    max_reminders: usize,
    max_delta: Duration,
}

impl<S: ReminderStore> ReminderService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_reminders: MAX_REMINDERS,
            max_delta: Duration::days(MAX_DELTA_DAYS),
        }
    }

    /// Create a reminder due `amount` units from now.
    ///
    /// The quota boundary is a pre-insert `count >= max` check, so a user
    /// tops out at exactly `MAX_REMINDERS` reminders (matching the limit the
    /// error message advertises).
    pub async fn create(
        &self,
        guild_id: u64,
        channel_id: Option<u64>,
        user_id: u64,
        amount: f64,
        unit: &str,
        message: Option<String>,
    ) -> Result<ReminderAck, ReminderError> {
        let unit = TimeUnit::parse(unit).ok_or(ReminderError::UnknownUnit)?;

        // NaN fails this comparison too, which is what we want.
        if !(amount > 0.0) {
            return Err(ReminderError::NonPositiveAmount);
        }

        // The cast saturates on absurd amounts; try_seconds then rejects
        // anything chrono can't represent.
        let delta = Duration::try_seconds((unit.seconds() * amount) as i64)
            .ok_or(ReminderError::TooFarAhead)?;
        if delta > self.max_delta {
            return Err(ReminderError::TooFarAhead);
        }

        if let Some(message) = &message {
            if message.chars().count() > MAX_MESSAGE_LEN {
                return Err(ReminderError::MessageTooLong);
            }
        }

        let count = self.store.count_for_user(user_id).await?;
        if count >= self.max_reminders {
            return Err(ReminderError::QuotaExceeded);
        }

        let now = Utc::now();
        let remind_on = now + delta;
        let id = self
            .store
            .insert(NewReminder {
                guild_id,
                channel_id,
                user_id,
                made_on: now,
                remind_on,
                message,
            })
            .await?;

        Ok(ReminderAck { id, remind_on })
    }

    /// A user's reminders in a guild, newest first. An empty result is
    /// reported as `NoReminders` so the command layer can show it as a
    /// plain user-facing message.
    pub async fn list(&self, guild_id: u64, user_id: u64) -> Result<Vec<Reminder>, ReminderError> {
        let reminders = self.store.list_for_user(guild_id, user_id).await?;
        if reminders.is_empty() {
            return Err(ReminderError::NoReminders);
        }
        Ok(reminders)
    }

    /// Owner-initiated delete. Wrong owner, wrong guild and nonexistent id
    /// are deliberately indistinguishable in the result.
    pub async fn delete(&self, id: i64, guild_id: u64, user_id: u64) -> Result<(), ReminderError> {
        if self.store.delete_owned(id, guild_id, user_id).await? {
            Ok(())
        } else {
            Err(ReminderError::NotFound)
        }
    }

    /// Snapshot of everything due at tick start. Scheduler-only.
    pub(crate) async fn due_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, ReminderError> {
        self.store.due_before(now).await
    }

    /// Remove a dispatched reminder so it can never fire again. Idempotent;
    /// racing an owner delete of the same row is safe.
    pub(crate) async fn clear_after_dispatch(&self, id: i64) -> Result<bool, ReminderError> {
        self.store.delete(id).await
    }
}

// ============================================================================
// RENDERING HELPERS
// ============================================================================
// Pure functions used by the list command and tests.

/// "Soon..." when within the threshold of its due time, otherwise a
/// human-readable countdown.
pub fn time_remaining_label(remind_on: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (remind_on - now).num_seconds();
    if secs < SOON_THRESHOLD_SECS {
        "Soon...".to_string()
    } else {
        pretty_seconds(secs)
    }
}

/// Render a second count as its two most significant parts,
/// e.g. 93784 -> "1 day, 2 hours".
pub fn pretty_seconds(total: i64) -> String {
    if total <= 0 {
        return "0 seconds".to_string();
    }

    let parts = [
        (total / 604_800, "week"),
        (total % 604_800 / 86_400, "day"),
        (total % 86_400 / 3_600, "hour"),
        (total % 3_600 / 60, "minute"),
        (total % 60, "second"),
    ];

    let rendered: Vec<String> = parts
        .iter()
        .filter(|(value, _)| *value > 0)
        .take(2)
        .map(|(value, name)| format!("{} {}{}", value, name, if *value == 1 { "" } else { "s" }))
        .collect();

    rendered.join(", ")
}

/// Truncate text for an embed field, appending an ellipsis when cut.
pub fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::reminders::InMemoryReminderStore;

    fn make_service() -> ReminderService<InMemoryReminderStore> {
        ReminderService::new(InMemoryReminderStore::new())
    }

    #[test]
    fn unit_aliases_resolve_case_insensitively() {
        for alias in ["m", "min", "mins", "minute", "MINUTES"] {
            assert_eq!(TimeUnit::parse(alias), Some(TimeUnit::Minutes));
        }
        for alias in ["h", "hr", "hrs", "Hour", "hours"] {
            assert_eq!(TimeUnit::parse(alias), Some(TimeUnit::Hours));
        }
        assert_eq!(TimeUnit::parse("days"), Some(TimeUnit::Days));
        assert_eq!(TimeUnit::parse("wk"), Some(TimeUnit::Weeks));
        assert_eq!(TimeUnit::parse("fortnight"), None);
    }

    #[tokio::test]
    async fn aliased_units_produce_identical_due_times() {
        let service = make_service();

        let a = service
            .create(1, Some(10), 100, 2.0, "hours", None)
            .await
            .unwrap();
        let b = service
            .create(1, Some(10), 100, 2.0, "hrs", None)
            .await
            .unwrap();

        let drift = (a.remind_on - b.remind_on).num_seconds().abs();
        assert!(drift <= 1, "due times drifted by {drift}s");
    }

    #[tokio::test]
    async fn horizon_boundary_is_exactly_one_year() {
        let service = make_service();

        service
            .create(1, None, 100, 365.0, "days", None)
            .await
            .expect("365 days should be accepted");

        let err = service
            .create(1, None, 100, 366.0, "days", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReminderError::TooFarAhead));
    }

    #[tokio::test]
    async fn rejects_bad_amounts_and_units() {
        let service = make_service();

        assert!(matches!(
            service.create(1, None, 100, 5.0, "fortnight", None).await,
            Err(ReminderError::UnknownUnit)
        ));
        assert!(matches!(
            service.create(1, None, 100, 0.0, "m", None).await,
            Err(ReminderError::NonPositiveAmount)
        ));
        assert!(matches!(
            service.create(1, None, 100, -3.0, "m", None).await,
            Err(ReminderError::NonPositiveAmount)
        ));
        assert!(matches!(
            service.create(1, None, 100, f64::NAN, "m", None).await,
            Err(ReminderError::NonPositiveAmount)
        ));
    }

    #[tokio::test]
    async fn rejects_oversized_messages() {
        let service = make_service();
        let long = "x".repeat(MAX_MESSAGE_LEN + 1);

        let err = service
            .create(1, None, 100, 5.0, "m", Some(long))
            .await
            .unwrap_err();
        assert!(matches!(err, ReminderError::MessageTooLong));

        // Exactly at the limit is fine.
        let exact = "x".repeat(MAX_MESSAGE_LEN);
        service
            .create(1, None, 100, 5.0, "m", Some(exact))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn quota_admits_twelfth_and_rejects_thirteenth() {
        let service = make_service();

        for i in 0..MAX_REMINDERS {
            service
                .create(1, None, 100, 1.0, "h", None)
                .await
                .unwrap_or_else(|e| panic!("reminder {} rejected: {e}", i + 1));
        }

        let err = service
            .create(1, None, 100, 1.0, "h", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReminderError::QuotaExceeded));

        // The quota is per user, so someone else is unaffected.
        service.create(1, None, 101, 1.0, "h", None).await.unwrap();
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped_to_guild() {
        let service = make_service();

        let first = service.create(1, None, 100, 1.0, "h", None).await.unwrap();
        let second = service.create(1, None, 100, 2.0, "h", None).await.unwrap();
        service.create(2, None, 100, 1.0, "h", None).await.unwrap();

        let listed = service.list(1, 100).await.unwrap();
        assert_eq!(
            listed.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
    }

    #[tokio::test]
    async fn empty_list_is_a_user_facing_not_found() {
        let service = make_service();
        let err = service.list(1, 100).await.unwrap_err();
        assert!(matches!(err, ReminderError::NoReminders));
        assert!(err.is_user_facing());
    }

    #[tokio::test]
    async fn delete_requires_full_ownership_match() {
        let service = make_service();
        let ack = service.create(1, None, 100, 1.0, "h", None).await.unwrap();

        // Wrong user, wrong guild and unknown id all look the same.
        assert!(matches!(
            service.delete(ack.id, 1, 999).await,
            Err(ReminderError::NotFound)
        ));
        assert!(matches!(
            service.delete(ack.id, 2, 100).await,
            Err(ReminderError::NotFound)
        ));
        assert!(matches!(
            service.delete(ack.id + 50, 1, 100).await,
            Err(ReminderError::NotFound)
        ));

        // The reminder survived all of the above.
        assert_eq!(service.list(1, 100).await.unwrap().len(), 1);

        service.delete(ack.id, 1, 100).await.unwrap();
        assert!(matches!(
            service.delete(ack.id, 1, 100).await,
            Err(ReminderError::NotFound)
        ));
    }

    #[test]
    fn pretty_seconds_picks_two_leading_parts() {
        assert_eq!(pretty_seconds(0), "0 seconds");
        assert_eq!(pretty_seconds(1), "1 second");
        assert_eq!(pretty_seconds(59), "59 seconds");
        assert_eq!(pretty_seconds(90), "1 minute, 30 seconds");
        assert_eq!(pretty_seconds(3_600), "1 hour");
        assert_eq!(pretty_seconds(93_784), "1 day, 2 hours");
        assert_eq!(pretty_seconds(604_800), "1 week");
    }

    #[test]
    fn countdown_flips_to_soon_inside_threshold() {
        let now = Utc::now();

        let close = now + Duration::seconds(14);
        assert_eq!(time_remaining_label(close, now), "Soon...");

        let not_yet = now + Duration::seconds(30);
        assert_eq!(time_remaining_label(not_yet, now), "30 seconds");
    }

    #[test]
    fn shorten_truncates_with_ellipsis() {
        assert_eq!(shorten("hello", 10), "hello");
        assert_eq!(shorten("hello world", 8), "hello...");
        assert_eq!(shorten("hello", 5), "hello");
    }

    #[test]
    fn default_body_substitution() {
        let reminder = Reminder {
            id: 1,
            guild_id: 1,
            channel_id: None,
            user_id: 100,
            made_on: Utc::now(),
            remind_on: Utc::now(),
            message: None,
        };
        assert_eq!(reminder.body(), DEFAULT_REMINDER_MESSAGE);
    }
}
