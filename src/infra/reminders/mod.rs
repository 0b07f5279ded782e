// Implementations of the reminder store.

pub mod in_memory;
pub mod sqlite_store;

// Re-export for convenience
pub use in_memory::InMemoryReminderStore;
pub use sqlite_store::SqliteReminderStore;
