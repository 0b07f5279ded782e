// Gateway event handlers for the guild event logger.
//
// Every handler follows the same shape: bail early when the event isn't
// loggable, build a `LogEvent`, and hand it to `send_log`. Log delivery
// failures are warned about and swallowed so they never take down the
// event loop.

use crate::core::logging::{LogEvent, TrackedMessage, VoiceFlags};
use crate::discord::logging::formatter::format_log_event;
use crate::discord::Data;
use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context, Mentionable};

/// Snapshot incoming guild messages so deletions can be logged later.
pub fn handle_message(data: &Data, message: &serenity::Message) {
    let Some(guild_id) = message.guild_id else {
        return;
    };

    data.logging.remember_message(TrackedMessage {
        message_id: message.id.get(),
        guild_id: guild_id.get(),
        channel_id: message.channel_id.get(),
        author_id: message.author.id.get(),
        author_name: message.author.name.clone(),
        author_is_bot: message.author.bot,
        content: message.content.clone(),
        attachments: message
            .attachments
            .iter()
            .map(|a| a.filename.clone())
            .collect(),
        avatar_url: message.author.avatar_url(),
    });
}

pub async fn handle_message_delete(
    ctx: &Context,
    data: &Data,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    guild_id: Option<serenity::GuildId>,
) -> Result<()> {
    let guild_id = match guild_id {
        Some(id) => id.get(),
        None => return Ok(()),
    };

    // Prefer our own snapshot over the Serenity cache so we can still
    // describe messages the cache has evicted.
    let snapshot = data
        .logging
        .take_tracked_message(message_id.get())
        .or_else(|| {
            ctx.cache.message(channel_id, message_id).map(|message| TrackedMessage {
                message_id: message.id.get(),
                guild_id,
                channel_id: message.channel_id.get(),
                author_id: message.author.id.get(),
                author_name: message.author.name.clone(),
                author_is_bot: message.author.bot,
                content: message.content.clone(),
                attachments: message
                    .attachments
                    .iter()
                    .map(|a| a.filename.clone())
                    .collect(),
                avatar_url: message.author.avatar_url(),
            })
        });

    let snapshot = match snapshot {
        Some(msg) if !msg.author_is_bot && msg.guild_id == guild_id => msg,
        _ => return Ok(()),
    };

    let event = LogEvent::MessageDeleted {
        guild_id,
        channel_id: snapshot.channel_id,
        author_id: snapshot.author_id,
        author_name: snapshot.author_name,
        content: snapshot.content,
        attachments: snapshot.attachments,
        avatar_url: snapshot.avatar_url,
    };

    send_log(ctx, data, guild_id, event).await
}

pub async fn handle_member_join(
    ctx: &Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<()> {
    let guild_id = member.guild_id.get();

    let event = LogEvent::MemberJoined {
        guild_id,
        user_id: member.user.id.get(),
        user_mention: member.mention().to_string(),
        avatar_url: member.user.avatar_url(),
        created_at: *member.user.created_at(),
    };

    send_log(ctx, data, guild_id, event).await
}

pub async fn handle_member_remove(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
) -> Result<()> {
    let guild_id = guild_id.get();

    let event = LogEvent::MemberLeft {
        guild_id,
        user_id: user.id.get(),
        user_name: user.name.clone(),
        avatar_url: user.avatar_url(),
    };

    send_log(ctx, data, guild_id, event).await
}

pub async fn handle_ban(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
) -> Result<()> {
    let guild_id = guild_id.get();

    let event = LogEvent::MemberBanned {
        guild_id,
        user_id: user.id.get(),
        user_name: user.name.clone(),
        avatar_url: user.avatar_url(),
    };

    send_log(ctx, data, guild_id, event).await
}

pub async fn handle_unban(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
) -> Result<()> {
    let guild_id = guild_id.get();

    let event = LogEvent::MemberUnbanned {
        guild_id,
        user_id: user.id.get(),
        user_name: user.name.clone(),
        avatar_url: user.avatar_url(),
    };

    send_log(ctx, data, guild_id, event).await
}

pub async fn handle_voice_state_update(
    ctx: &Context,
    data: &Data,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) -> Result<()> {
    let Some(guild_id) = new.guild_id.map(|id| id.get()) else {
        return Ok(());
    };

    // Without a prior state there is nothing to diff against.
    let Some(old) = old else {
        return Ok(());
    };

    let user = match new.member.as_ref() {
        Some(member) if !member.user.bot => &member.user,
        Some(_) => return Ok(()),
        None => return Ok(()),
    };

    let event = LogEvent::voice_state_changed(
        guild_id,
        user.id.get(),
        user.name.clone(),
        user.avatar_url(),
        VoiceFlags {
            deaf: old.deaf,
            mute: old.mute,
        },
        VoiceFlags {
            deaf: new.deaf,
            mute: new.mute,
        },
    );

    match event {
        Some(event) => send_log(ctx, data, guild_id, event).await,
        None => Ok(()),
    }
}

pub async fn handle_channel_create(
    ctx: &Context,
    data: &Data,
    channel: &serenity::GuildChannel,
) -> Result<()> {
    let guild_id = channel.guild_id.get();

    let event = LogEvent::ChannelCreated {
        guild_id,
        channel_id: channel.id.get(),
        kind: channel_kind(channel.kind),
    };

    send_log(ctx, data, guild_id, event).await
}

pub async fn handle_channel_delete(
    ctx: &Context,
    data: &Data,
    channel: &serenity::GuildChannel,
) -> Result<()> {
    let guild_id = channel.guild_id.get();

    let event = LogEvent::ChannelDeleted {
        guild_id,
        channel_id: channel.id.get(),
        name: channel.name.clone(),
        kind: channel_kind(channel.kind),
    };

    send_log(ctx, data, guild_id, event).await
}

fn channel_kind(kind: serenity::ChannelType) -> String {
    match kind {
        serenity::ChannelType::Text => "Text",
        serenity::ChannelType::Voice => "Voice",
        serenity::ChannelType::Category => "Category",
        _ => "Channel",
    }
    .to_string()
}

async fn send_log(ctx: &Context, data: &Data, guild_id: u64, event: LogEvent) -> Result<()> {
    let Some(channel_id) = data.logging.log_target(guild_id).await? else {
        return Ok(());
    };

    let embed = format_log_event(&event);
    let channel = serenity::ChannelId::new(channel_id);

    if let Err(e) = channel
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
        .await
    {
        tracing::warn!("Failed to send log to channel {}: {}", channel_id, e);
    }
    Ok(())
}
