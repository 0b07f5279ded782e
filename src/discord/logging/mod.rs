// Discord-side half of the guild event logger: slash commands for
// configuration, gateway handlers, and the embed formatter.

pub mod commands;
pub mod events;
pub mod formatter;
