// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bug-report tracking.

use tracing::{info, instrument, warn};

use super::answer_error;
use crate::bot::Bot;
use crate::error::Result;
use crate::events::BugCommand;
use crate::platform::{InteractionRef, Reply, ThreadInfo};

const UPDATE_FAILED: &str = "Failed to update bug reports.";

/// A new post in the bug-reports forum: greet it and start tracking it.
#[instrument(skip(bot, thread), fields(thread_id = %thread.id))]
pub async fn thread_created(bot: &Bot, thread: &ThreadInfo) -> Result<()> {
    let owner = bot.platform.guild_owner(&bot.config.guild_id).await?;
    bot.platform
        .send_message(
            &thread.id,
            &format!(
                "Bug report created by <@{}>.\n(Adding <@{}>.)",
                thread.owner_id, owner
            ),
        )
        .await?;

    if bot.bug_reports.insert(&thread.id).await? {
        info!("Bug report tracked");
    }
    Ok(())
}

/// `/editbugs add|fixed`.
#[instrument(skip(bot, interaction, command), fields(interaction_id = %interaction.id))]
pub async fn command(bot: &Bot, interaction: &InteractionRef, command: BugCommand) -> Result<()> {
    bot.platform.defer_reply(interaction, false).await?;

    let text = match command {
        BugCommand::Add { id } => match add(bot, &id).await {
            Ok(text) => text,
            Err(e) => return answer_error(bot, interaction, true, UPDATE_FAILED, e).await,
        },
        BugCommand::Fixed { id } => fixed(bot, &id).await,
    };
    bot.platform
        .edit_reply(interaction, &Reply::text(text))
        .await?;
    Ok(())
}

async fn add(bot: &Bot, id: &str) -> Result<&'static str> {
    let message = bot
        .platform
        .fetch_message(&bot.config.bug_reports_channel, id)
        .await?;
    if message.is_none() {
        return Ok("Could not find message.");
    }

    Ok(match bot.bug_reports.insert(id).await {
        Ok(true) => {
            info!(message_id = %id, "Message marked as bug report");
            "Message has been marked as a bug report."
        }
        Ok(false) => "Message is already a bug report",
        Err(e) => {
            warn!(message_id = %id, error = %e, "Failed to persist bug reports");
            UPDATE_FAILED
        }
    })
}

async fn fixed(bot: &Bot, id: &str) -> &'static str {
    match bot.bug_reports.remove(id).await {
        Ok(true) => {
            info!(message_id = %id, "Bug report removed");
            "Bug report has been removed."
        }
        Ok(false) => "Message is not a bug report.",
        Err(e) => {
            warn!(message_id = %id, error = %e, "Failed to persist bug reports");
            UPDATE_FAILED
        }
    }
}
