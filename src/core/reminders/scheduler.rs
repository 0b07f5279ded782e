// Periodic poll loop for due reminders.
//
// One tick: snapshot everything due, attempt delivery per row, delete the
// row whatever happened. At-most-once, best-effort: a reminder can never
// fire twice, but a send that fails while the sink is unavailable is
// dropped rather than retried.

use super::reminder_service::{Reminder, ReminderError, ReminderService, ReminderStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Fixed poll period. Reminders created with a due time already in the
/// past are simply picked up by the next tick.
pub const CHECK_EVERY: Duration = Duration::from_secs(60);

/// Delivery failures. Consumed inside the tick - logged, never propagated,
/// and the row is deleted regardless.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("target could not be resolved")]
    UnknownTarget,

    #[error("send rejected: {0}")]
    SendRejected(String),
}

/// What the sink renders and sends. `body` already has the default
/// message text substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotice {
    pub reminder_id: i64,
    pub user_id: u64,
    pub body: String,
    pub made_on: DateTime<Utc>,
}

/// The external message-sending capability. Implemented over the Discord
/// client in the discord layer and by recording mocks in tests.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Post into a channel, mentioning the reminder's owner.
    /// `Err(UnknownTarget)` when the channel does not resolve.
    async fn send_to_channel(
        &self,
        channel_id: u64,
        notice: &ReminderNotice,
    ) -> Result<(), DeliveryError>;

    /// Direct-message the owner. `Err(UnknownTarget)` when the user does
    /// not resolve.
    async fn send_direct(
        &self,
        user_id: u64,
        notice: &ReminderNotice,
    ) -> Result<(), DeliveryError>;
}

/// Outcome of one tick. Dropped rows keep their target ids so the log
/// line can say where delivery was attempted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub delivered: usize,
    pub dropped: Vec<DroppedDelivery>,
}

/// A reminder whose delivery attempt failed (and whose row was deleted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedDelivery {
    pub reminder_id: i64,
    pub channel_id: Option<u64>,
    pub user_id: u64,
}

/// Drives the poll loop. Ticks are sequential within the owning task, so
/// two ticks can never process overlapping snapshots.
pub struct ReminderScheduler<S: ReminderStore, D: DeliverySink> {
    service: Arc<ReminderService<S>>,
    sink: D,
    period: Duration,
}

impl<S: ReminderStore, D: DeliverySink> ReminderScheduler<S, D> {
    pub fn new(service: Arc<ReminderService<S>>, sink: D) -> Self {
        Self {
            service,
            sink,
            period: CHECK_EVERY,
        }
    }

    /// Runs forever. A failed tick (store unreachable) is logged and the
    /// loop waits for the next period; nothing here may take the task down.
    pub async fn run(self) {
        let mut timer = tokio::time::interval(self.period);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            timer.tick().await;

            match self.tick(Utc::now()).await {
                Ok(report) if report.due > 0 => {
                    tracing::info!(
                        due = report.due,
                        delivered = report.delivered,
                        dropped = report.dropped.len(),
                        "reminder tick finished"
                    );
                }
                Ok(_) => {}
                Err(err) => tracing::warn!("reminder tick failed: {err}"),
            }
        }
    }

    /// One full tick over a fixed snapshot. A fault in one row's delivery
    /// neither skips that row's deletion nor the remaining rows.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport, ReminderError> {
        let due = self.service.due_reminders(now).await?;
        let mut report = TickReport {
            due: due.len(),
            ..TickReport::default()
        };

        for reminder in due {
            match self.dispatch(&reminder).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.dropped.push(DroppedDelivery {
                        reminder_id: reminder.id,
                        channel_id: reminder.channel_id,
                        user_id: reminder.user_id,
                    });
                    tracing::warn!(
                        reminder_id = reminder.id,
                        channel_id = reminder.channel_id,
                        user_id = reminder.user_id,
                        "failed to deliver reminder: {err}"
                    );
                }
            }

            // The row goes away no matter how delivery went, so the
            // reminder can never fire twice.
            if let Err(err) = self.service.clear_after_dispatch(reminder.id).await {
                tracing::error!(
                    reminder_id = reminder.id,
                    "failed to delete dispatched reminder: {err}"
                );
            }
        }

        Ok(report)
    }

    /// Ordered delivery attempt: the creation channel first, a DM as
    /// fallback only when the channel doesn't resolve. A rejected send
    /// after a successful resolve is final.
    async fn dispatch(&self, reminder: &Reminder) -> Result<(), DeliveryError> {
        let notice = ReminderNotice {
            reminder_id: reminder.id,
            user_id: reminder.user_id,
            body: reminder.body().to_string(),
            made_on: reminder.made_on,
        };

        if let Some(channel_id) = reminder.channel_id {
            match self.sink.send_to_channel(channel_id, &notice).await {
                Err(DeliveryError::UnknownTarget) => {}
                other => return other,
            }
        }

        self.sink.send_direct(reminder.user_id, &notice).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reminders::DEFAULT_REMINDER_MESSAGE;
    use crate::infra::reminders::InMemoryReminderStore;
    use chrono::Duration as ChronoDuration;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy)]
    enum Behavior {
        Deliver,
        Unknown,
        Reject,
    }

    struct RecordingSink {
        channel_behavior: Behavior,
        direct_behavior: Behavior,
        channel_sends: Mutex<Vec<ReminderNotice>>,
        direct_sends: Mutex<Vec<ReminderNotice>>,
    }

    impl RecordingSink {
        fn new(channel_behavior: Behavior, direct_behavior: Behavior) -> Self {
            Self {
                channel_behavior,
                direct_behavior,
                channel_sends: Mutex::new(Vec::new()),
                direct_sends: Mutex::new(Vec::new()),
            }
        }

        fn attempts_for(&self, reminder_id: i64) -> usize {
            let channel = self.channel_sends.lock().unwrap();
            let direct = self.direct_sends.lock().unwrap();
            channel
                .iter()
                .chain(direct.iter())
                .filter(|n| n.reminder_id == reminder_id)
                .count()
        }
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn send_to_channel(
            &self,
            _channel_id: u64,
            notice: &ReminderNotice,
        ) -> Result<(), DeliveryError> {
            match self.channel_behavior {
                Behavior::Unknown => Err(DeliveryError::UnknownTarget),
                Behavior::Reject => Err(DeliveryError::SendRejected("boom".into())),
                Behavior::Deliver => {
                    self.channel_sends.lock().unwrap().push(notice.clone());
                    Ok(())
                }
            }
        }

        async fn send_direct(
            &self,
            _user_id: u64,
            notice: &ReminderNotice,
        ) -> Result<(), DeliveryError> {
            match self.direct_behavior {
                Behavior::Unknown => Err(DeliveryError::UnknownTarget),
                Behavior::Reject => Err(DeliveryError::SendRejected("boom".into())),
                Behavior::Deliver => {
                    self.direct_sends.lock().unwrap().push(notice.clone());
                    Ok(())
                }
            }
        }
    }

    fn make_scheduler(
        channel: Behavior,
        direct: Behavior,
    ) -> ReminderScheduler<InMemoryReminderStore, RecordingSink> {
        let service = Arc::new(ReminderService::new(InMemoryReminderStore::new()));
        ReminderScheduler::new(service, RecordingSink::new(channel, direct))
    }

    /// Creates a reminder due roughly `in_secs` from now and returns its id.
    async fn create_due_in(
        scheduler: &ReminderScheduler<InMemoryReminderStore, RecordingSink>,
        channel_id: Option<u64>,
        in_secs: f64,
        message: Option<&str>,
    ) -> i64 {
        scheduler
            .service
            .create(
                1,
                channel_id,
                100,
                in_secs / 60.0,
                "m",
                message.map(str::to_string),
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn delivers_at_most_once_and_deletes_the_row() {
        let scheduler = make_scheduler(Behavior::Deliver, Behavior::Deliver);
        let id = create_due_in(&scheduler, Some(10), 60.0, Some("stretch")).await;

        // A tick before the due time leaves the reminder alone.
        let early = scheduler.tick(Utc::now()).await.unwrap();
        assert_eq!(early.due, 0);
        assert_eq!(scheduler.sink.attempts_for(id), 0);

        let later = Utc::now() + ChronoDuration::seconds(61);
        let report = scheduler.tick(later).await.unwrap();
        assert_eq!(report.due, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(scheduler.sink.attempts_for(id), 1);

        // The row is gone; a second tick finds nothing and never re-sends.
        let again = scheduler.tick(later).await.unwrap();
        assert_eq!(again.due, 0);
        assert_eq!(scheduler.sink.attempts_for(id), 1);
        assert!(scheduler.service.list(1, 100).await.is_err());
    }

    #[tokio::test]
    async fn rejected_send_still_deletes_the_row() {
        let scheduler = make_scheduler(Behavior::Reject, Behavior::Reject);
        create_due_in(&scheduler, Some(10), 1.0, None).await;

        let later = Utc::now() + ChronoDuration::seconds(5);
        let report = scheduler.tick(later).await.unwrap();
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.delivered, 0);

        assert_eq!(scheduler.tick(later).await.unwrap().due, 0);
    }

    #[tokio::test]
    async fn unknown_channel_falls_back_to_direct_message() {
        let scheduler = make_scheduler(Behavior::Unknown, Behavior::Deliver);
        let id = create_due_in(&scheduler, Some(10), 1.0, None).await;

        let later = Utc::now() + ChronoDuration::seconds(5);
        let report = scheduler.tick(later).await.unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(scheduler.sink.direct_sends.lock().unwrap().len(), 1);
        assert_eq!(scheduler.sink.attempts_for(id), 1);
    }

    #[tokio::test]
    async fn rejected_channel_send_does_not_fall_back() {
        let scheduler = make_scheduler(Behavior::Reject, Behavior::Deliver);
        create_due_in(&scheduler, Some(10), 1.0, None).await;

        let later = Utc::now() + ChronoDuration::seconds(5);
        let report = scheduler.tick(later).await.unwrap();
        assert_eq!(report.dropped.len(), 1);
        assert!(scheduler.sink.direct_sends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_channel_goes_straight_to_direct_message() {
        let scheduler = make_scheduler(Behavior::Deliver, Behavior::Deliver);
        create_due_in(&scheduler, None, 1.0, None).await;

        let later = Utc::now() + ChronoDuration::seconds(5);
        scheduler.tick(later).await.unwrap();
        assert!(scheduler.sink.channel_sends.lock().unwrap().is_empty());
        assert_eq!(scheduler.sink.direct_sends.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unresolvable_everywhere_is_dropped_and_deleted() {
        let scheduler = make_scheduler(Behavior::Unknown, Behavior::Unknown);
        create_due_in(&scheduler, Some(10), 1.0, None).await;

        let later = Utc::now() + ChronoDuration::seconds(5);
        let report = scheduler.tick(later).await.unwrap();
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(scheduler.tick(later).await.unwrap().due, 0);
    }

    #[tokio::test]
    async fn one_failing_row_does_not_block_the_rest() {
        // Channel sends bounce, DMs work: the channel-bound reminder is
        // dropped while the DM-only one is still delivered and both rows
        // are cleared in the same tick.
        let scheduler = make_scheduler(Behavior::Reject, Behavior::Deliver);
        create_due_in(&scheduler, Some(10), 1.0, None).await;
        create_due_in(&scheduler, None, 1.0, None).await;

        let later = Utc::now() + ChronoDuration::seconds(5);
        let report = scheduler.tick(later).await.unwrap();
        assert_eq!(report.due, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(scheduler.tick(later).await.unwrap().due, 0);
    }

    #[tokio::test]
    async fn dropped_rows_record_the_attempted_target() {
        let scheduler = make_scheduler(Behavior::Reject, Behavior::Reject);
        let channel_bound = create_due_in(&scheduler, Some(10), 1.0, None).await;
        let dm_only = create_due_in(&scheduler, None, 1.0, None).await;

        let later = Utc::now() + ChronoDuration::seconds(5);
        let report = scheduler.tick(later).await.unwrap();

        let channel_drop = report
            .dropped
            .iter()
            .find(|d| d.reminder_id == channel_bound)
            .unwrap();
        assert_eq!(channel_drop.channel_id, Some(10));
        assert_eq!(channel_drop.user_id, 100);

        let dm_drop = report
            .dropped
            .iter()
            .find(|d| d.reminder_id == dm_only)
            .unwrap();
        assert_eq!(dm_drop.channel_id, None);
        assert_eq!(dm_drop.user_id, 100);
    }

    #[tokio::test]
    async fn notice_substitutes_default_message_at_render_time() {
        let scheduler = make_scheduler(Behavior::Deliver, Behavior::Deliver);
        create_due_in(&scheduler, Some(10), 1.0, None).await;

        let later = Utc::now() + ChronoDuration::seconds(5);
        scheduler.tick(later).await.unwrap();

        let sends = scheduler.sink.channel_sends.lock().unwrap();
        assert_eq!(sends[0].body, DEFAULT_REMINDER_MESSAGE);
    }

    #[tokio::test]
    async fn one_minute_reminder_fires_on_the_next_tick_after_due() {
        let scheduler = make_scheduler(Behavior::Deliver, Behavior::Deliver);
        let id = create_due_in(&scheduler, Some(10), 60.0, None).await;

        let created = Utc::now();
        assert_eq!(scheduler.tick(created).await.unwrap().due, 0);

        let report = scheduler
            .tick(created + ChronoDuration::seconds(61))
            .await
            .unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(scheduler.sink.attempts_for(id), 1);
    }
}
