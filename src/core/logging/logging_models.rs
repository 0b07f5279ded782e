use chrono::{DateTime, Utc};

/// Per-guild logger configuration: where to post, and whether to post at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub guild_id: u64,
    pub enabled: bool,
    pub channel_id: Option<u64>,
}

/// The guild events the logger forwards as embeds.
#[derive(Debug, Clone)]
pub enum LogEvent {
    MessageDeleted {
        guild_id: u64,
        channel_id: u64,
        author_id: u64,
        author_name: String,
        content: String,
        attachments: Vec<String>,
        avatar_url: Option<String>,
    },
    MemberJoined {
        guild_id: u64,
        user_id: u64,
        user_mention: String,
        avatar_url: Option<String>,
        created_at: DateTime<Utc>,
    },
    MemberLeft {
        guild_id: u64,
        user_id: u64,
        user_name: String,
        avatar_url: Option<String>,
    },
    MemberBanned {
        guild_id: u64,
        user_id: u64,
        user_name: String,
        avatar_url: Option<String>,
    },
    MemberUnbanned {
        guild_id: u64,
        user_id: u64,
        user_name: String,
        avatar_url: Option<String>,
    },
    VoiceStateChanged {
        guild_id: u64,
        user_id: u64,
        user_name: String,
        avatar_url: Option<String>,
        /// New value when the flag changed, None when it didn't.
        deaf: Option<bool>,
        mute: Option<bool>,
    },
    ChannelCreated {
        guild_id: u64,
        channel_id: u64,
        kind: String,
    },
    ChannelDeleted {
        guild_id: u64,
        channel_id: u64,
        name: String,
        kind: String,
    },
}

impl LogEvent {
    /// Diff two voice states into an event. Only the server deaf/mute flags
    /// are tracked; when neither changed there is nothing to log.
    pub fn voice_state_changed(
        guild_id: u64,
        user_id: u64,
        user_name: String,
        avatar_url: Option<String>,
        old: VoiceFlags,
        new: VoiceFlags,
    ) -> Option<LogEvent> {
        let deaf = (old.deaf != new.deaf).then_some(new.deaf);
        let mute = (old.mute != new.mute).then_some(new.mute);
        if deaf.is_none() && mute.is_none() {
            return None;
        }

        Some(LogEvent::VoiceStateChanged {
            guild_id,
            user_id,
            user_name,
            avatar_url,
            deaf,
            mute,
        })
    }
}

/// The server-side voice flags the logger watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceFlags {
    pub deaf: bool,
    pub mute: bool,
}

/// Minimal snapshot of a message kept in-memory so deletions can still
/// be described after the gateway cache has moved on.
#[derive(Debug, Clone)]
pub struct TrackedMessage {
    pub message_id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
    pub attachments: Vec<String>,
    pub avatar_url: Option<String>,
}
