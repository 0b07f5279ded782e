// Discord commands module.
// Each feature gets its own command file.

pub mod reminders;

pub mod reputation;
