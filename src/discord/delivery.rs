// Serenity-backed delivery sink for the reminder scheduler.
//
// The scheduler stays platform-agnostic; this adapter turns a
// `ReminderNotice` into a channel post (or DM) the same way the command
// layer turns service results into replies.

use crate::core::reminders::{DeliveryError, DeliverySink, ReminderNotice};
use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, CreateEmbed, CreateMessage};
use std::sync::Arc;

pub struct DiscordDeliverySink {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl DiscordDeliverySink {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self { http, cache }
    }

    fn notice_message(&self, notice: &ReminderNotice, mention_owner: bool) -> CreateMessage {
        let mut embed = CreateEmbed::new()
            .title("Reminder:")
            .description(notice.body.clone())
            .color(0x3498db);

        if let Ok(ts) = serenity::Timestamp::from_unix_timestamp(notice.made_on.timestamp()) {
            embed = embed.timestamp(ts);
        }

        let mut message = CreateMessage::new().embed(embed);
        if mention_owner {
            message = message.content(format!("<@{}>", notice.user_id));
        }
        message
    }
}

#[async_trait]
impl DeliverySink for DiscordDeliverySink {
    async fn send_to_channel(
        &self,
        channel_id: u64,
        notice: &ReminderNotice,
    ) -> Result<(), DeliveryError> {
        let channel = serenity::ChannelId::new(channel_id);

        // A channel missing from the cache was deleted (or we lost access)
        // while the reminder was pending; let the scheduler fall back to DM.
        if self.cache.channel(channel).is_none() {
            return Err(DeliveryError::UnknownTarget);
        }

        channel
            .send_message(&self.http, self.notice_message(notice, true))
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::SendRejected(e.to_string()))
    }

    async fn send_direct(
        &self,
        user_id: u64,
        notice: &ReminderNotice,
    ) -> Result<(), DeliveryError> {
        let user = self
            .http
            .get_user(serenity::UserId::new(user_id))
            .await
            .map_err(|_| DeliveryError::UnknownTarget)?;

        user.direct_message(&self.http, self.notice_message(notice, false))
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::SendRejected(e.to_string()))
    }
}
