mod logging_models;
mod logging_service;

pub use logging_models::{LogConfig, LogEvent, TrackedMessage, VoiceFlags};
pub use logging_service::{LogConfigStore, LoggingService};
