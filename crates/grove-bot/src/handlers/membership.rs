// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Membership screening, departures, welcomes and boosts.

use std::sync::Arc;

use async_trait::async_trait;
use grove_core::CoreError;
use grove_core::leave::{Departure, KickEntry, LeaveOutcome, LeaveSignals, MemberRef, Reason};
use tracing::{debug, info, instrument};

use crate::bot::Bot;
use crate::config::Config;
use crate::error::Result;
use crate::events::IncomingMessage;
use crate::platform::ChatPlatform;

/// Connects the leave tracker to the platform: kicks come from the audit
/// log, announcements go to the welcomes channel.
pub struct PlatformLeaveSignals {
    platform: Arc<dyn ChatPlatform>,
    guild_id: String,
    welcomes_channel: String,
    guild_name: String,
}

impl PlatformLeaveSignals {
    /// Signals for the guild described by `config`.
    pub fn new(platform: Arc<dyn ChatPlatform>, config: &Config) -> Self {
        Self {
            platform,
            guild_id: config.guild_id.clone(),
            welcomes_channel: config.welcomes_channel.clone(),
            guild_name: config.guild_name.clone(),
        }
    }
}

#[async_trait]
impl LeaveSignals for PlatformLeaveSignals {
    async fn latest_kick(&self) -> grove_core::Result<Option<KickEntry>> {
        self.platform
            .latest_kick(&self.guild_id)
            .await
            .map_err(|e| CoreError::collaborator("fetch audit log", e))
    }

    async fn announce(&self, departure: &Departure) -> grove_core::Result<()> {
        let text = departure_message(departure, &self.guild_name);
        self.platform
            .send_message(&self.welcomes_channel, &text)
            .await
            .map_err(|e| CoreError::collaborator("announce departure", e))
    }
}

/// Public announcement for a resolved departure.
pub fn departure_message(departure: &Departure, guild_name: &str) -> String {
    let member = &departure.member;
    let reason_suffix = |reason: &Option<String>| match reason {
        Some(reason) => format!(" for {reason}"),
        None => String::new(),
    };

    match &departure.outcome {
        LeaveOutcome::Banned { reason } => format!(
            "Curse you warlock, don't ever return! ({} has been banned from {}{})",
            member.tag,
            guild_name,
            reason_suffix(reason)
        ),
        LeaveOutcome::Kicked { reason } => format!(
            "Off to torment with you, {}! ({} has been kicked from {}{})",
            member.name(),
            member.tag,
            guild_name,
            reason_suffix(reason)
        ),
        LeaveOutcome::Left => format!(
            "Shame, {} was brewing a nice concoction as well ({} has left {})",
            member.name(),
            member.tag,
            guild_name
        ),
    }
}

/// A member joined: log it and start tracking their screening.
#[instrument(skip(bot, member), fields(member_id = %member.id))]
pub async fn member_joined(bot: &Bot, member: &MemberRef) -> Result<()> {
    bot.platform
        .send_message(
            &bot.config.log_channel,
            &format!("User {} entered membership screening.", member.mention()),
        )
        .await?;

    bot.pending_members.insert(&member.id).await?;
    Ok(())
}

/// A member is gone.
///
/// Members still in screening only get a log line. Everyone else gets a log
/// line and goes through leave reconciliation.
#[instrument(skip(bot, member), fields(member_id = %member.id))]
pub async fn member_removed(bot: &Bot, member: MemberRef) -> Result<()> {
    if bot.pending_members.remove(&member.id).await? {
        bot.platform
            .send_message(
                &bot.config.log_channel,
                &format!(
                    "User {}[{}] left membership screening.",
                    member.mention(),
                    member.tag
                ),
            )
            .await?;
        return Ok(());
    }

    bot.platform
        .send_message(
            &bot.config.log_channel,
            &format!("User {}[{}] left the server.", member.mention(), member.tag),
        )
        .await?;

    if let Some(outcome) = bot.leave.member_removed(member).await? {
        debug!(outcome = ?outcome, "Departure resolved on remove");
    }
    Ok(())
}

/// A user was banned.
#[instrument(skip(bot, user, reason), fields(member_id = %user.id))]
pub async fn ban_added(bot: &Bot, user: MemberRef, reason: Reason) -> Result<()> {
    if let Some(outcome) = bot.leave.ban_added(user, reason).await? {
        debug!(outcome = ?outcome, "Departure resolved on ban");
    }
    Ok(())
}

/// A platform join notice in the system welcomes channel means the author
/// finished screening.
pub async fn message_created(bot: &Bot, message: &IncomingMessage) -> Result<()> {
    if !message.system || message.channel_id != bot.config.system_welcomes_channel {
        return Ok(());
    }
    if !bot.pending_members.remove(&message.author_id).await? {
        return Ok(());
    }

    info!(member_id = %message.author_id, "Member passed screening");
    bot.platform
        .send_message(
            &bot.config.welcomes_channel,
            &format!("Welcome <@{}> to {}", message.author_id, bot.config.guild_name),
        )
        .await?;
    Ok(())
}

/// Thank members who just gained the booster role.
pub async fn member_updated(
    bot: &Bot,
    member: &MemberRef,
    old_roles: &[String],
    new_roles: &[String],
) -> Result<()> {
    let role = &bot.config.nitro_role;
    if old_roles.contains(role) || !new_roles.contains(role) {
        return Ok(());
    }

    info!(member_id = %member.id, "Member boosted the guild");
    bot.platform
        .send_message(
            &bot.config.nitro_channel,
            &format!(
                "🎉 🎉 Thank you {} for boosting {}!! 🎉 🎉",
                member.mention(),
                bot.config.guild_name
            ),
        )
        .await?;
    Ok(())
}
