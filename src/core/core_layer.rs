// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "logging/mod.rs"]
pub mod logging;

#[path = "reminders/mod.rs"]
pub mod reminders;

#[path = "reputation/reputation_service.rs"]
pub mod reputation;
