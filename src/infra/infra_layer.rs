// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "logging/log_store.rs"]
pub mod logging;

#[path = "reminders/mod.rs"]
pub mod reminders;

#[path = "reputation/rep_store.rs"]
pub mod reputation;
