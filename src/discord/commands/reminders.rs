// Discord commands for the reminder system.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response based on the result
//
// This layer is THIN - no business logic, just translation.

use crate::core::logging::LoggingService;
use crate::core::reminders::{
    shorten, time_remaining_label, ReminderError, ReminderService, REMINDERS_PER_PAGE,
};
use crate::core::reputation::ReputationService;
use crate::infra::logging::SqliteLogStore;
use crate::infra::reminders::SqliteReminderStore;
use crate::infra::reputation::SqliteRepStore;
use poise::serenity_prelude as serenity;

/// Set a reminder. The bot pings you in this channel (or your DMs) when it fires.
#[poise::command(slash_command, guild_only)]
pub async fn remindme(
    ctx: Context<'_>,
    #[description = "How many units to wait"]
    #[min = 0]
    amount: f64,
    #[description = "Time unit: minutes, hours, days or weeks"] unit: String,
    #[description = "What to remind you about"] message: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let channel_id = ctx.channel_id().get();
    let user_id = ctx.author().id.get();

    let result = ctx
        .data()
        .reminders
        .create(guild_id, Some(channel_id), user_id, amount, &unit, message)
        .await;

    match result {
        Ok(ack) => {
            ctx.say(format!(
                "✅ Reminder #{} set for <t:{}:R>.",
                ack.id,
                ack.remind_on.timestamp()
            ))
            .await?;
        }
        Err(err) => say_reminder_error(ctx, err).await?,
    }

    Ok(())
}

/// List your pending reminders in this server.
#[poise::command(slash_command, guild_only)]
pub async fn reminders(
    ctx: Context<'_>,
    #[description = "Page number (default: 1)"]
    #[min = 1]
    page: Option<u64>,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let user_id = ctx.author().id.get();

    let rows = match ctx.data().reminders.list(guild_id, user_id).await {
        Ok(rows) => rows,
        Err(err) => {
            say_reminder_error(ctx, err).await?;
            return Ok(());
        }
    };

    let per_page = REMINDERS_PER_PAGE;
    let total_pages = (rows.len() + per_page - 1) / per_page;
    let current_page = (page.unwrap_or(1) as usize).clamp(1, total_pages);
    let offset = (current_page - 1) * per_page;

    let now = chrono::Utc::now();
    let mut embed = serenity::CreateEmbed::new()
        .author(
            serenity::CreateEmbedAuthor::new(format!("Reminders of {}", ctx.author().name))
                .icon_url(ctx.author().face()),
        )
        .color(0x3498db)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Page {}/{}",
            current_page, total_pages
        )));

    for reminder in rows.iter().skip(offset).take(per_page) {
        embed = embed.field(
            format!("{}: {}", reminder.id, time_remaining_label(reminder.remind_on, now)),
            shorten(reminder.body(), 256),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Delete one of your reminders by its id.
#[poise::command(slash_command, guild_only)]
pub async fn delreminder(
    ctx: Context<'_>,
    #[description = "Reminder id (shown by /reminders)"]
    #[min = 1]
    reminder_id: i64,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let user_id = ctx.author().id.get();

    match ctx
        .data()
        .reminders
        .delete(reminder_id, guild_id, user_id)
        .await
    {
        Ok(()) => {
            ctx.say(format!("🗑️ Reminder #{} deleted.", reminder_id))
                .await?;
        }
        Err(err) => say_reminder_error(ctx, err).await?,
    }

    Ok(())
}

/// Reply with the validation message for user mistakes, bubble up real failures.
async fn say_reminder_error(ctx: Context<'_>, err: ReminderError) -> Result<(), Error> {
    if err.is_user_facing() {
        ctx.send(
            poise::CreateReply::default()
                .content(err.to_string())
                .ephemeral(true),
        )
        .await?;
        Ok(())
    } else {
        Err(err.into())
    }
}

/// Type alias for our bot's context.
/// This is what every command receives as its first parameter.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
/// This is where we store our services and configuration.
use std::sync::Arc;

pub struct Data {
    pub reminders: Arc<ReminderService<SqliteReminderStore>>,
    pub reputation: Arc<ReputationService<SqliteRepStore>>,
    pub logging: Arc<LoggingService<SqliteLogStore>>,
}
