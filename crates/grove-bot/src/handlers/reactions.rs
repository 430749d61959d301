// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Reaction roles.

use tracing::{debug, info};

use crate::bot::Bot;
use crate::config::ReactionRoles;
use crate::error::Result;
use crate::events::ReactionEvent;

/// Grant (`added`) or revoke the role mapped to a reaction.
///
/// The mapping is re-read from disk each time.
pub async fn reaction_changed(bot: &Bot, reaction: &ReactionEvent, added: bool) -> Result<()> {
    let roles = ReactionRoles::load(&bot.config.reaction_roles_path).await?;
    let Some(entry) = roles.role_for(&reaction.message_id, &reaction.emoji) else {
        debug!(message_id = %reaction.message_id, emoji = %reaction.emoji, "Reaction not mapped");
        return Ok(());
    };

    if added {
        bot.platform
            .add_role(&bot.config.guild_id, &reaction.user_id, &entry.role)
            .await?;
    } else {
        bot.platform
            .remove_role(&bot.config.guild_id, &reaction.user_id, &entry.role)
            .await?;
    }
    info!(
        user_id = %reaction.user_id,
        role = %entry.name,
        added,
        "Reaction role updated"
    );
    Ok(())
}
