// Discord layer - commands, event handlers and the delivery sink.

#[path = "commands/mod.rs"]
pub mod commands;

#[path = "delivery.rs"]
pub mod delivery;

#[path = "logging/mod.rs"]
pub mod logging;

// Re-export command types for convenience
pub use commands::reminders::{Context, Data, Error};
