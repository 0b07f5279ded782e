// Reminder system: validation + CRUD in reminder_service, the poll loop
// and delivery strategy in scheduler.

mod reminder_service;
mod scheduler;

pub use reminder_service::{
    pretty_seconds, shorten, time_remaining_label, NewReminder, Reminder, ReminderAck,
    ReminderError, ReminderService, ReminderStore, TimeUnit, DEFAULT_REMINDER_MESSAGE,
    MAX_DELTA_DAYS, MAX_MESSAGE_LEN, MAX_REMINDERS, REMINDERS_PER_PAGE, SOON_THRESHOLD_SECS,
};
pub use scheduler::{
    DeliveryError, DeliverySink, DroppedDelivery, ReminderNotice, ReminderScheduler, TickReport,
    CHECK_EVERY,
};
