// Discord commands for the reputation system.

use crate::core::reputation::RepError;
use poise::serenity_prelude as serenity;
use rand::seq::SliceRandom;

pub type Error = crate::discord::commands::reminders::Error;
pub type Context<'a> = crate::discord::commands::reminders::Context<'a>;

// Flavor emoji matched to the mood of the reply.
const GOOD_EMOJI: &[&str] = &["🙏", "🙌", "👏", "👌", "😛", "😍"];
const BAD_EMOJI: &[&str] = &["😢", "😥", "😪", "😭", "🤔"];

/// Give a member a reputation point, or check your own count.
#[poise::command(slash_command, guild_only)]
pub async fn rep(
    ctx: Context<'_>,
    #[description = "Member to rep (leave empty to see your own count)"] member: Option<
        serenity::User,
    >,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let author_id = ctx.author().id.get();

    let Some(member) = member else {
        let count = ctx.data().reputation.get_count(author_id, guild_id).await?;
        let reply = if count == 0 {
            format!("You have 0 reputation... {}", pick(BAD_EMOJI))
        } else {
            format!("You have {} reputation! {}", count, pick(GOOD_EMOJI))
        };
        ctx.say(reply).await?;
        return Ok(());
    };

    if member.bot {
        ctx.say("Bots run on electricity, not reputation. 🤖")
            .await?;
        return Ok(());
    }

    match ctx
        .data()
        .reputation
        .give(guild_id, author_id, member.id.get())
        .await
    {
        Ok(count) => {
            ctx.say(format!(
                "<@{}> now has {} reputation! {}",
                member.id.get(),
                count,
                pick(GOOD_EMOJI)
            ))
            .await?;
        }
        Err(RepError::SelfRep) => {
            ctx.say("👺 👎").await?;
        }
        Err(err) if err.is_user_facing() => {
            ctx.send(
                poise::CreateReply::default()
                    .content(err.to_string())
                    .ephemeral(true),
            )
            .await?;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

/// Show a list of the most respected users.
#[poise::command(slash_command, guild_only)]
pub async fn replist(
    ctx: Context<'_>,
    #[description = "How many users to show (default: 8)"]
    #[min = 3]
    #[max = 20]
    amount: Option<u64>,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let top = ctx
        .data()
        .reputation
        .top(guild_id, amount.unwrap_or(8) as usize)
        .await?;

    // Resolve display names from the cached member list. Users who have
    // left the guild since earning reputation are skipped, not shown as
    // raw mentions.
    let (guild_name, rows) = {
        let Some(guild) = ctx.guild() else {
            return Err("Guild not in cache".into());
        };
        let rows: Vec<(Option<String>, i64)> = top
            .iter()
            .map(|u| {
                let name = guild
                    .members
                    .get(&serenity::UserId::new(u.user_id))
                    .map(|m| m.display_name().to_string());
                (name, u.count)
            })
            .collect();
        (guild.name.clone(), rows)
    };

    let Some((users, counts)) = replist_columns(rows) else {
        ctx.say("No users with any reputation in this server.")
            .await?;
        return Ok(());
    };

    let embed = serenity::CreateEmbed::new()
        .author(serenity::CreateEmbedAuthor::new(guild_name))
        .color(0xffd700)
        .field("Users", users, true)
        .field("Reputation", counts, true);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// The two aligned embed columns for the leaderboard. Entries without a
/// resolved name are dropped; None when nobody resolved at all.
fn replist_columns(rows: Vec<(Option<String>, i64)>) -> Option<(String, String)> {
    let mut users = String::new();
    let mut counts = String::new();
    let mut added = 0;

    for (name, count) in rows {
        let Some(name) = name else { continue };
        users.push_str(&name);
        users.push('\n');
        counts.push_str(&count.to_string());
        counts.push('\n');
        added += 1;
    }

    (added > 0).then_some((users, counts))
}

fn pick(pool: &[&str]) -> String {
    pool.choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("🙂")
        .to_string()
}
