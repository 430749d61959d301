// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Suggestion posts, moderation commands and paginated lookups.

use grove_core::session::{Direction, Page};
use grove_core::CoreError;
use tracing::{debug, info, instrument, warn};

use super::answer_error;
use crate::bot::Bot;
use crate::error::Result;
use crate::events::{EditSuggestionCommand, GetSuggestionCommand};
use crate::platform::{Button, Embed, InteractionRef, MessageInfo, Reply, ThreadInfo};
use crate::suggestions::{NewSuggestion, Suggestion, SuggestionError, suggestion_embed};

const MENU_EXPIRED: &str = "This menu has expired.";
const FETCH_FAILED: &str = "Failed to fetch suggestion.";

/// Split a navigation button id (`left-<id>` / `right-<id>`) into its
/// direction and the id of the interaction that owns the session.
pub fn parse_navigation(custom_id: &str) -> Option<(Direction, &str)> {
    let (direction, interaction_id) = custom_id.split_once('-')?;
    if interaction_id.is_empty() {
        return None;
    }
    Some((direction.parse().ok()?, interaction_id))
}

/// Previous/next buttons for a session page, disabled at the ends.
pub fn navigation_buttons<P>(interaction_id: &str, page: &Page<P>) -> Vec<Button> {
    vec![
        Button {
            custom_id: format!("left-{interaction_id}"),
            emoji: "⬅️".to_string(),
            disabled: !page.has_previous(),
        },
        Button {
            custom_id: format!("right-{interaction_id}"),
            emoji: "➡️".to_string(),
            disabled: !page.has_next(),
        },
    ]
}

fn page_reply(interaction_id: &str, page: Page<Embed>) -> Reply {
    let buttons = navigation_buttons(interaction_id, &page);
    Reply::embed(page.content).with_buttons(buttons).ephemeral()
}

async fn render(bot: &Bot, title: String, suggestion: &Suggestion) -> Result<Embed> {
    let origin = bot
        .platform
        .fetch_starter_message(&suggestion.message_id)
        .await?;
    Ok(suggestion_embed(title, suggestion, origin.as_ref()))
}

/// Tell moderators that a service call failed.
async fn report_failure(bot: &Bot, path: &str, error: &SuggestionError) -> Result<()> {
    let owner = bot.platform.guild_owner(&bot.config.guild_id).await?;
    let (code, text) = error.status_line();
    bot.platform
        .send_message(
            &bot.config.log_channel,
            &format!(
                "<@{owner}> Request to suggestion path {path} failed\nStatus Code: {code}\nStatus Text: {text}"
            ),
        )
        .await?;
    Ok(())
}

/// Answer a failed moderation call: not-found is the user's mistake, anything
/// else is reported to the log channel.
async fn answer_failure(
    bot: &Bot,
    interaction: &InteractionRef,
    error: SuggestionError,
    not_found: &str,
    failed: &str,
    path: &str,
) -> Result<()> {
    if matches!(error, SuggestionError::NotFound) {
        bot.platform
            .reply(interaction, &Reply::text(not_found).ephemeral())
            .await?;
        return Ok(());
    }

    warn!(path = %path, error = %error, "Suggestion service call failed");
    bot.platform
        .reply(interaction, &Reply::text(failed).ephemeral())
        .await?;
    report_failure(bot, path, &error).await
}

/// A new post in the suggestions forum: register it with the service.
#[instrument(skip(bot, thread), fields(thread_id = %thread.id))]
pub async fn thread_created(bot: &Bot, thread: &ThreadInfo) -> Result<()> {
    let Some(starter) = bot.platform.fetch_starter_message(&thread.id).await? else {
        warn!("Suggestion post has no starter message");
        return Ok(());
    };

    let request = NewSuggestion {
        creator_id: thread.owner_id.clone(),
        thread_id: thread.id.clone(),
        title: thread.name.clone(),
        content: starter.content.clone(),
        creator_name: starter.author_name.clone(),
    };

    match bot.suggestions.add(&request).await {
        Ok(id) => {
            info!(suggestion_id = id, "Suggestion created");
            let owner = bot.platform.guild_owner(&bot.config.guild_id).await?;
            bot.platform
                .send_message(
                    &thread.id,
                    &format!(
                        "Suggestion #{id} created by <@{}>.\n(Adding <@{owner}>.)",
                        thread.owner_id
                    ),
                )
                .await?;
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Failed to register suggestion");
            bot.platform
                .send_message(&thread.id, "Failed to request suggestion.")
                .await?;
            report_failure(bot, &format!("add/{}/{}", thread.id, starter.id), &e).await
        }
    }
}

/// `/editsuggestions state|delete|add`.
#[instrument(skip(bot, interaction, command), fields(interaction_id = %interaction.id))]
pub async fn edit_command(
    bot: &Bot,
    interaction: &InteractionRef,
    command: EditSuggestionCommand,
) -> Result<()> {
    match command {
        EditSuggestionCommand::State { id, state } => {
            match bot.suggestions.update_state(id, state).await {
                Ok(suggestion) => {
                    info!(suggestion_id = id, state = ?state, "Suggestion state updated");
                    let title = format!("Suggestion #{} has been updated", suggestion.id);
                    let embed = match render(bot, title, &suggestion).await {
                        Ok(embed) => embed,
                        Err(e) => {
                            return answer_error(bot, interaction, false, FETCH_FAILED, e).await;
                        }
                    };
                    bot.platform.reply(interaction, &Reply::embed(embed)).await?;
                    Ok(())
                }
                Err(e) => {
                    answer_failure(
                        bot,
                        interaction,
                        e,
                        "Invalid suggestion ID.",
                        "Failed to update suggestion.",
                        &id.to_string(),
                    )
                    .await
                }
            }
        }
        EditSuggestionCommand::Delete { id } => match bot.suggestions.delete(id).await {
            Ok(()) => {
                info!(suggestion_id = id, "Suggestion deleted");
                bot.platform
                    .reply(interaction, &Reply::text("Suggestion deleted successfully."))
                    .await?;
                Ok(())
            }
            Err(e) => {
                answer_failure(
                    bot,
                    interaction,
                    e,
                    "Invalid suggestion ID.",
                    "Failed to delete suggestion.",
                    &id.to_string(),
                )
                .await
            }
        },
        EditSuggestionCommand::Add { id } => add_existing_post(bot, interaction, &id).await,
    }
}

/// The forum post behind `thread_id` and its starter message, if it is a
/// post in the suggestions forum.
async fn suggestion_post(bot: &Bot, thread_id: &str) -> Result<Option<(ThreadInfo, MessageInfo)>> {
    let Some(thread) = bot
        .platform
        .fetch_thread(thread_id)
        .await?
        .filter(|t| t.parent_id == bot.config.suggestions_channel)
    else {
        return Ok(None);
    };
    let starter = bot.platform.fetch_starter_message(&thread.id).await?;
    Ok(starter.map(|starter| (thread, starter)))
}

async fn add_existing_post(bot: &Bot, interaction: &InteractionRef, thread_id: &str) -> Result<()> {
    let post = match suggestion_post(bot, thread_id).await {
        Ok(post) => post,
        Err(e) => {
            return answer_error(bot, interaction, false, "Failed to request suggestion.", e).await;
        }
    };
    let Some((thread, starter)) = post else {
        bot.platform
            .reply(interaction, &Reply::text("Post not found").ephemeral())
            .await?;
        return Ok(());
    };

    let request = NewSuggestion {
        creator_id: thread.owner_id.clone(),
        thread_id: thread.id.clone(),
        title: thread.name.clone(),
        content: starter.content.clone(),
        creator_name: starter.author_name.clone(),
    };

    match bot.suggestions.add(&request).await {
        Ok(id) => {
            info!(suggestion_id = id, thread_id = %thread.id, "Existing post marked as suggestion");
            let embed = Embed::described(format!(
                "Marked [message]({}) by <@{}> as suggestion with ID {id}.",
                starter.url, starter.author_id
            ));
            bot.platform.reply(interaction, &Reply::embed(embed)).await?;
            Ok(())
        }
        Err(e) => {
            answer_failure(
                bot,
                interaction,
                e,
                "Invalid message ID.",
                "Failed to request suggestion.",
                "add",
            )
            .await
        }
    }
}

fn fetch_failure(error: SuggestionError, not_found: &str, failed: &str) -> Reply {
    match error {
        SuggestionError::NotFound => Reply::text(not_found).ephemeral(),
        other => {
            warn!(error = %other, "Suggestion lookup failed");
            Reply::text(failed).ephemeral()
        }
    }
}

/// `/getsuggestions view|message|user`.
#[instrument(skip(bot, interaction, command), fields(interaction_id = %interaction.id))]
pub async fn get_command(
    bot: &Bot,
    interaction: &InteractionRef,
    command: GetSuggestionCommand,
) -> Result<()> {
    let hidden = command.hidden();
    bot.platform.defer_reply(interaction, hidden).await?;

    let reply = match command {
        GetSuggestionCommand::View { id, .. } => {
            let found = bot.suggestions.get(id).await;
            single_suggestion(bot, found, "Invalid suggestion ID.").await
        }
        GetSuggestionCommand::Message { id, .. } => {
            let found = bot.suggestions.by_message(&id).await;
            single_suggestion(bot, found, "Invalid message ID.").await
        }
        GetSuggestionCommand::User { user, .. } => user_suggestions(bot, interaction, &user).await,
    };

    match reply {
        Ok(reply) => bot.platform.edit_reply(interaction, &reply).await?,
        Err(e) => return answer_error(bot, interaction, true, FETCH_FAILED, e).await,
    }
    Ok(())
}

async fn single_suggestion(
    bot: &Bot,
    found: std::result::Result<Suggestion, SuggestionError>,
    not_found: &str,
) -> Result<Reply> {
    match found {
        Ok(suggestion) => {
            let title = format!("Suggestion #{}", suggestion.id);
            Ok(Reply::embed(render(bot, title, &suggestion).await?))
        }
        Err(e) => Ok(fetch_failure(e, not_found, FETCH_FAILED)),
    }
}

async fn user_suggestions(bot: &Bot, interaction: &InteractionRef, user_id: &str) -> Result<Reply> {
    let suggestions = match bot.suggestions.by_author(user_id).await {
        Ok(suggestions) => suggestions,
        Err(SuggestionError::NotFound) => Vec::new(),
        Err(e) => {
            return Ok(fetch_failure(
                e,
                "User has no suggestions.",
                "Failed to fetch suggestions.",
            ));
        }
    };
    let Some(first) = suggestions.first() else {
        return Ok(Reply::text("User has no suggestions.").ephemeral());
    };

    let first_page = render(bot, format!("Suggestion #{}", first.id), first).await?;
    let count = suggestions.len();
    let page = bot
        .sessions
        .create(interaction.id.clone(), suggestions, first_page)
        .await?;
    debug!(user_id = %user_id, count, "Suggestion menu opened");

    Ok(page_reply(&interaction.id, page))
}

/// Navigation button on a suggestion menu.
#[instrument(skip(bot, interaction), fields(interaction_id = %interaction.id))]
pub async fn button(bot: &Bot, interaction: &InteractionRef, custom_id: &str) -> Result<()> {
    bot.platform.defer_update(interaction).await?;

    let Some((direction, session_id)) = parse_navigation(custom_id) else {
        debug!(custom_id = %custom_id, "Ignoring unknown button");
        return Ok(());
    };

    let platform = bot.platform.clone();
    let navigated = bot
        .sessions
        .navigate(session_id, direction, move |suggestion| async move {
            let origin = platform
                .fetch_starter_message(&suggestion.message_id)
                .await
                .map_err(|e| CoreError::collaborator("fetch suggestion post", e))?;
            Ok(suggestion_embed(
                format!("Suggestion #{}", suggestion.id),
                &suggestion,
                origin.as_ref(),
            ))
        })
        .await;

    let reply = match navigated {
        Ok(page) => page_reply(session_id, page),
        Err(CoreError::SessionNotFound(_)) => {
            debug!(session_id = %session_id, "Navigation on expired menu");
            Reply::text(MENU_EXPIRED).ephemeral()
        }
        Err(e) => {
            // The session keeps its page, so the user can press again.
            return answer_error(bot, interaction, true, FETCH_FAILED, e.into()).await;
        }
    };
    bot.platform.edit_reply(interaction, &reply).await?;
    Ok(())
}
