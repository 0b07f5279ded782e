// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (databases)
// - `discord/` = Discord-specific adapters (commands, events, delivery)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands, event handlers and the reminder scheduler

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::logging::LoggingService;
use crate::core::reminders::{ReminderScheduler, ReminderService};
use crate::core::reputation::ReputationService;
use crate::discord::delivery::DiscordDeliverySink;
use crate::discord::logging::events as logging_events;
use crate::discord::{Data, Error};
use crate::infra::logging::SqliteLogStore;
use crate::infra::reminders::SqliteReminderStore;
use crate::infra::reputation::SqliteRepStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
/// This is where the event logger watches the gateway.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            logging_events::handle_message(data, new_message);
        }
        serenity::FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            guild_id,
        } => {
            if let Err(e) = logging_events::handle_message_delete(
                ctx,
                data,
                *channel_id,
                *deleted_message_id,
                *guild_id,
            )
            .await
            {
                tracing::error!("Error handling message delete: {}", e);
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(e) = logging_events::handle_member_join(ctx, data, new_member).await {
                tracing::error!("Error handling member join log: {}", e);
            }
        }
        serenity::FullEvent::GuildMemberRemoval {
            guild_id,
            user,
            member_data_if_available: _,
        } => {
            if let Err(e) = logging_events::handle_member_remove(ctx, data, *guild_id, user).await {
                tracing::error!("Error handling member remove log: {}", e);
            }
        }
        serenity::FullEvent::GuildBanAddition {
            guild_id,
            banned_user,
        } => {
            if let Err(e) = logging_events::handle_ban(ctx, data, *guild_id, banned_user).await {
                tracing::error!("Error handling ban log: {}", e);
            }
        }
        serenity::FullEvent::GuildBanRemoval {
            guild_id,
            unbanned_user,
        } => {
            if let Err(e) = logging_events::handle_unban(ctx, data, *guild_id, unbanned_user).await
            {
                tracing::error!("Error handling unban log: {}", e);
            }
        }
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            if let Err(e) =
                logging_events::handle_voice_state_update(ctx, data, old.as_ref(), new).await
            {
                tracing::error!("Error handling voice state update: {}", e);
            }
        }
        serenity::FullEvent::ChannelCreate { channel } => {
            if let Err(e) = logging_events::handle_channel_create(ctx, data, channel).await {
                tracing::error!("Error handling channel create log: {}", e);
            }
        }
        serenity::FullEvent::ChannelDelete { channel, .. } => {
            if let Err(e) = logging_events::handle_channel_delete(ctx, data, channel).await {
                tracing::error!("Error handling channel delete log: {}", e);
            }
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).expect("Failed to create data directory for SQLite files");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let reminder_store = SqliteReminderStore::new(&format!("{}/reminders.db", data_dir))
        .await
        .expect("Failed to initialize reminder store");
    let reminder_service = Arc::new(ReminderService::new(reminder_store));

    let log_store = SqliteLogStore::new(&format!("{}/logging.db", data_dir))
        .await
        .expect("Failed to initialize log store");
    let logging_service = Arc::new(LoggingService::new(log_store));

    let rep_store = SqliteRepStore::new(&format!("{}/reps.db", data_dir))
        .await
        .expect("Failed to initialize reputation store");
    let reputation_service = Arc::new(ReputationService::new(rep_store));

    // Create the data structure that will be shared across all commands
    let data = Data {
        reminders: Arc::clone(&reminder_service),
        reputation: Arc::clone(&reputation_service),
        logging: Arc::clone(&logging_service),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to log deleted message content
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MODERATION
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![
                discord::commands::reminders::remindme(),
                discord::commands::reminders::reminders(),
                discord::commands::reminders::delreminder(),
                discord::commands::reputation::rep(),
                discord::commands::reputation::replist(),
                discord::logging::commands::log(),
            ],
            // Event handler for the guild event logger
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                // Register slash commands globally (can take up to an hour to propagate)
                // For faster development, use register_in_guild instead:
                // poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id).await?;
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                tracing::info!("Commands registered");

                // Background reminder scheduler. Polls the store once a minute
                // and delivers whatever came due.
                let sink = DiscordDeliverySink::new(ctx.http.clone(), ctx.cache.clone());
                let scheduler = ReminderScheduler::new(Arc::clone(&data.reminders), sink);
                tokio::spawn(scheduler.run());

                tracing::info!("Bot is ready");
                Ok(data)
            })
        })
        .build();

    // Create the client and start the bot
    let mut settings = serenity::cache::Settings::default();
    settings.max_messages = 1000;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .cache_settings(settings)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
