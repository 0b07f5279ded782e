use crate::core::logging::LogEvent;
use poise::serenity_prelude::{self as serenity, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter};

// Destructive events (deletions, bans) share this color.
const ALERT_COLOR: u32 = 0xFF4000;

pub fn format_log_event(event: &LogEvent) -> CreateEmbed {
    match event {
        LogEvent::MessageDeleted {
            channel_id,
            author_id,
            author_name,
            content,
            attachments,
            avatar_url,
            ..
        } => {
            let description = if content.is_empty() {
                "*No content*".to_string()
            } else {
                content.chars().take(4096).collect()
            };

            let mut author = CreateEmbedAuthor::new(author_name.clone());
            if let Some(url) = avatar_url {
                author = author.icon_url(url.clone());
            }

            let mut embed = CreateEmbed::default()
                .title("Message deleted")
                .description(description)
                .field("Channel", format!("<#{}>", channel_id), false)
                .author(author)
                .color(ALERT_COLOR)
                .footer(CreateEmbedFooter::new(format!("Author ID: {}", author_id)))
                .timestamp(serenity::Timestamp::now());

            if !attachments.is_empty() {
                embed = embed.field("Attachments", attachments.join("\n"), false);
            }
            embed
        }

        LogEvent::MemberJoined {
            user_id,
            user_mention,
            avatar_url,
            created_at,
            ..
        } => {
            let mut embed = CreateEmbed::default()
                .title("Member joined")
                .description(format!("{} has joined the server.", user_mention))
                .color(serenity::Color::from_rgb(0, 255, 0))
                .field(
                    "Account created",
                    format!("<t:{}:R>", created_at.timestamp()),
                    false,
                )
                .footer(CreateEmbedFooter::new(format!("ID: {}", user_id)))
                .timestamp(serenity::Timestamp::now());

            if let Some(url) = avatar_url {
                embed = embed.thumbnail(url.clone());
            }
            embed
        }

        LogEvent::MemberLeft {
            user_id,
            user_name,
            avatar_url,
            ..
        } => member_embed("Member left", *user_id, user_name, avatar_url, None),

        LogEvent::MemberBanned {
            user_id,
            user_name,
            avatar_url,
            ..
        } => member_embed(
            "Member banned",
            *user_id,
            user_name,
            avatar_url,
            Some(ALERT_COLOR),
        ),

        LogEvent::MemberUnbanned {
            user_id,
            user_name,
            avatar_url,
            ..
        } => member_embed("Member unbanned", *user_id, user_name, avatar_url, None),

        LogEvent::VoiceStateChanged {
            user_id,
            user_name,
            avatar_url,
            deaf,
            mute,
            ..
        } => {
            let mut embed = member_embed(
                "Member voice state update",
                *user_id,
                user_name,
                avatar_url,
                Some(ALERT_COLOR),
            );
            if let Some(deaf) = deaf {
                embed = embed.field("Deaf", if *deaf { "yes" } else { "no" }, true);
            }
            if let Some(mute) = mute {
                embed = embed.field("Mute", if *mute { "yes" } else { "no" }, true);
            }
            embed
        }

        LogEvent::ChannelCreated {
            channel_id, kind, ..
        } => CreateEmbed::default()
            .title(format!("{} channel created", kind))
            .description(format!("<#{}>", channel_id))
            .footer(CreateEmbedFooter::new(format!("ID: {}", channel_id)))
            .timestamp(serenity::Timestamp::now()),

        LogEvent::ChannelDeleted {
            channel_id,
            name,
            kind,
            ..
        } => CreateEmbed::default()
            .title(format!("{} channel deleted", kind))
            .description(format!("#{}", name))
            .color(ALERT_COLOR)
            .footer(CreateEmbedFooter::new(format!("ID: {}", channel_id)))
            .timestamp(serenity::Timestamp::now()),
    }
}

fn member_embed(
    title: &str,
    user_id: u64,
    user_name: &str,
    avatar_url: &Option<String>,
    color: Option<u32>,
) -> CreateEmbed {
    let mut author = CreateEmbedAuthor::new(user_name.to_string());
    if let Some(url) = avatar_url {
        author = author.icon_url(url.clone());
    }

    let mut embed = CreateEmbed::default()
        .title(title.to_string())
        .author(author)
        .footer(CreateEmbedFooter::new(format!("ID: {}", user_id)))
        .timestamp(serenity::Timestamp::now());

    if let Some(color) = color {
        embed = embed.color(color);
    }
    embed
}
