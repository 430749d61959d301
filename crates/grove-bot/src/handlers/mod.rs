// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Event handlers.
//!
//! Each handler takes the shared [`Bot`](crate::bot::Bot) and one event's
//! payload. Shared state is only touched through the coordinated structures
//! on the bot, so handlers for different events can run concurrently.

pub mod bug_reports;
pub mod membership;
pub mod reactions;
pub mod suggestions;

use tracing::warn;

use crate::bot::Bot;
use crate::error::{Error, Result};
use crate::platform::{InteractionRef, Reply};

/// Tell the user an interaction failed after it was acknowledged.
///
/// `deferred` selects editing the deferred reply over sending a new one. The
/// error is logged and the interaction counts as handled.
pub(crate) async fn answer_error(
    bot: &Bot,
    interaction: &InteractionRef,
    deferred: bool,
    text: &str,
    error: Error,
) -> Result<()> {
    warn!(interaction_id = %interaction.id, error = %error, "{text}");
    let reply = Reply::text(text).ephemeral();
    if deferred {
        bot.platform.edit_reply(interaction, &reply).await?;
    } else {
        bot.platform.reply(interaction, &reply).await?;
    }
    Ok(())
}
