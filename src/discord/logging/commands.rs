use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Manage the guild event logger.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("status", "channel", "enable", "disable")
)]
pub async fn log(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the current logger configuration.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();
    let config = ctx.data().logging.get_config(guild_id).await?;

    let (status, channel_mention) = if let Some(cfg) = config {
        let status = if cfg.enabled && cfg.channel_id.is_some() {
            "Enabled"
        } else {
            "Disabled"
        };
        let mention = cfg
            .channel_id
            .map(|id| format!("<#{}>", id))
            .unwrap_or_else(|| "Not set".to_string());
        (status, mention)
    } else {
        ("Disabled", "Not set".to_string())
    };

    let embed = serenity::CreateEmbed::default()
        .title("Event Logger Configuration")
        .color(serenity::Color::BLURPLE)
        .field("Status", status, false)
        .field("Log Channel", channel_mention, false)
        .field(
            "Tracked Events",
            "• Message Delete\n• Member Join/Leave\n• Ban/Unban\n• Channel Create/Delete",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Guild ID: {}",
            guild_id
        )))
        .timestamp(serenity::Timestamp::now());

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Select the text channel log embeds are posted to.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn channel(
    ctx: Context<'_>,
    #[description = "Channel to log to"]
    #[channel_types("Text")]
    channel: serenity::Channel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();
    let channel_id = channel.id().get();

    ctx.data()
        .logging
        .set_log_channel(guild_id, channel_id)
        .await?;
    ctx.say(format!("✅ Log channel set to <#{}>.", channel_id))
        .await?;
    Ok(())
}

/// Enable event logging.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();

    if ctx.data().logging.set_enabled(guild_id, true).await? {
        ctx.say("✅ Event logging enabled.").await?;
    } else {
        ctx.say("Please pick a log channel first using `/log channel #channel`.")
            .await?;
    }
    Ok(())
}

/// Disable event logging.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();

    if ctx.data().logging.set_enabled(guild_id, false).await? {
        ctx.say("🛑 Event logging disabled.").await?;
    } else {
        ctx.say("Logging is not configured for this server.")
            .await?;
    }
    Ok(())
}
