// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Suggestion posts, `/editsuggestions`, `/getsuggestions` and menu buttons.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::*;
use grove_bot::BotEvent;
use grove_bot::events::{Command, EditSuggestionCommand, GetSuggestionCommand};
use grove_bot::platform::mock::PlatformCall;
use grove_bot::platform::{COLOR_GREEN, Reply};
use grove_bot::suggestions::{ApprovalState, NewSuggestion, Suggestion};

fn edit(interaction_id: &str, command: EditSuggestionCommand) -> BotEvent {
    BotEvent::Command {
        interaction: interaction(interaction_id),
        command: Command::EditSuggestions(command),
    }
}

fn get(interaction_id: &str, command: GetSuggestionCommand) -> BotEvent {
    BotEvent::Command {
        interaction: interaction(interaction_id),
        command: Command::GetSuggestions(command),
    }
}

fn press(interaction_id: &str, custom_id: &str) -> BotEvent {
    BotEvent::Button {
        interaction: interaction(interaction_id),
        custom_id: custom_id.to_string(),
    }
}

fn stored(id: u64, author_id: &str, message_id: &str) -> Suggestion {
    Suggestion {
        id,
        author_id: author_id.to_string(),
        message_id: message_id.to_string(),
        state: ApprovalState::Pending,
    }
}

fn title(reply: &Reply) -> &str {
    reply.embeds[0].title.as_deref().unwrap()
}

fn buttons_disabled(reply: &Reply) -> Vec<bool> {
    reply.buttons.iter().map(|b| b.disabled).collect()
}

/// Three suggestions by user 42, each backed by a forum post.
fn seed_user_suggestions(h: &Harness) {
    for id in 1..=3u64 {
        let post = format!("t{id}");
        h.platform.insert_thread(
            thread(&post, SUGGESTIONS_FORUM, "42"),
            &format!("idea number {id}"),
            "willow",
        );
        h.suggestions.insert(stored(id, "42", &post));
    }
}

#[tokio::test]
async fn test_forum_post_registers_suggestion() {
    let h = Harness::new().await;
    let post = thread("4000", SUGGESTIONS_FORUM, "10");
    h.platform
        .insert_thread(post.clone(), "Add a potion channel", "hazel");

    h.bot
        .dispatch(BotEvent::ThreadCreated { thread: post })
        .await
        .unwrap();

    assert_eq!(
        h.suggestions.added(),
        vec![NewSuggestion {
            creator_id: "10".into(),
            thread_id: "4000".into(),
            title: "Post 4000".into(),
            content: "Add a potion channel".into(),
            creator_name: "hazel".into(),
        }]
    );
    assert_eq!(
        h.platform.messages_in("4000"),
        vec!["Suggestion #1 created by <@10>.\n(Adding <@500>.)".to_string()]
    );
}

#[tokio::test]
async fn test_forum_post_failure_is_reported() {
    let h = Harness::new().await;
    let post = thread("4001", SUGGESTIONS_FORUM, "10");
    h.platform.insert_thread(post.clone(), "Dark mode", "hazel");
    h.suggestions.fail_with(Some(500));

    h.bot
        .dispatch(BotEvent::ThreadCreated { thread: post })
        .await
        .unwrap();

    assert_eq!(
        h.platform.messages_in("4001"),
        vec!["Failed to request suggestion.".to_string()]
    );
    assert_eq!(
        h.platform.messages_in(LOG),
        vec![
            "<@500> Request to suggestion path add/4001/4001 failed\nStatus Code: 500\nStatus Text: Internal Server Error"
                .to_string()
        ]
    );
}

#[tokio::test]
async fn test_state_update_replies_with_embed() {
    let h = Harness::new().await;
    seed_user_suggestions(&h);

    h.bot
        .dispatch(edit(
            "1",
            EditSuggestionCommand::State {
                id: 2,
                state: ApprovalState::Approved,
            },
        ))
        .await
        .unwrap();

    let reply = h.platform.last_response("1").unwrap();
    assert!(!reply.ephemeral);
    assert_eq!(title(&reply), "Suggestion #2 has been updated");
    let embed = &reply.embeds[0];
    assert_eq!(
        embed.description.as_deref(),
        Some("[idea number 2](https://discord.test/t2/t2)")
    );
    assert_eq!(embed.fields[0].value, "<@42>");
    assert_eq!(embed.fields[1].value, "Approved :white_check_mark:");
    assert_eq!(embed.color, Some(COLOR_GREEN));
    assert_eq!(
        h.suggestions.stored(2).map(|s| s.state),
        Some(ApprovalState::Approved)
    );
}

#[tokio::test]
async fn test_state_update_with_unreachable_post() {
    let h = Harness::new().await;
    seed_user_suggestions(&h);
    h.platform.fail_fetches.store(true, Ordering::SeqCst);

    h.bot
        .dispatch(edit(
            "1",
            EditSuggestionCommand::State {
                id: 2,
                state: ApprovalState::Denied,
            },
        ))
        .await
        .unwrap();

    assert_eq!(
        h.platform.last_response("1"),
        Some(Reply::text("Failed to fetch suggestion.").ephemeral())
    );
    // The service already applied the change.
    assert_eq!(
        h.suggestions.stored(2).map(|s| s.state),
        Some(ApprovalState::Denied)
    );
}

#[tokio::test]
async fn test_state_update_unknown_id() {
    let h = Harness::new().await;

    h.bot
        .dispatch(edit(
            "1",
            EditSuggestionCommand::State {
                id: 99,
                state: ApprovalState::Denied,
            },
        ))
        .await
        .unwrap();

    assert_eq!(
        h.platform.last_response("1"),
        Some(Reply::text("Invalid suggestion ID.").ephemeral())
    );
    assert!(h.platform.messages_in(LOG).is_empty());
}

#[tokio::test]
async fn test_delete() {
    let h = Harness::new().await;
    seed_user_suggestions(&h);

    h.bot
        .dispatch(edit("1", EditSuggestionCommand::Delete { id: 1 }))
        .await
        .unwrap();
    assert_eq!(
        h.platform.last_response("1"),
        Some(Reply::text("Suggestion deleted successfully."))
    );
    assert_eq!(h.suggestions.stored(1), None);

    h.bot
        .dispatch(edit("2", EditSuggestionCommand::Delete { id: 1 }))
        .await
        .unwrap();
    assert_eq!(
        h.platform.last_response("2"),
        Some(Reply::text("Invalid suggestion ID.").ephemeral())
    );
}

#[tokio::test]
async fn test_delete_service_failure_is_reported() {
    let h = Harness::new().await;
    h.suggestions.fail_with(Some(503));

    h.bot
        .dispatch(edit("1", EditSuggestionCommand::Delete { id: 7 }))
        .await
        .unwrap();

    assert_eq!(
        h.platform.last_response("1"),
        Some(Reply::text("Failed to delete suggestion.").ephemeral())
    );
    assert_eq!(
        h.platform.messages_in(LOG),
        vec![
            "<@500> Request to suggestion path 7 failed\nStatus Code: 503\nStatus Text: Internal Server Error"
                .to_string()
        ]
    );
}

#[tokio::test]
async fn test_add_existing_post() {
    let h = Harness::new().await;
    h.platform.insert_thread(
        thread("4002", SUGGESTIONS_FORUM, "10"),
        "Seasonal roles",
        "hazel",
    );

    h.bot
        .dispatch(edit("1", EditSuggestionCommand::Add { id: "4002".into() }))
        .await
        .unwrap();

    let reply = h.platform.last_response("1").unwrap();
    assert_eq!(
        reply.embeds[0].description.as_deref(),
        Some("Marked [message](https://discord.test/4002/4002) by <@10> as suggestion with ID 1.")
    );
    assert_eq!(h.suggestions.added().len(), 1);
}

#[tokio::test]
async fn test_add_rejects_posts_outside_suggestions_forum() {
    let h = Harness::new().await;
    h.platform
        .insert_thread(thread("4003", BUG_FORUM, "10"), "Crash on login", "hazel");

    for (interaction_id, thread_id) in [("1", "4003"), ("2", "missing")] {
        h.bot
            .dispatch(edit(
                interaction_id,
                EditSuggestionCommand::Add {
                    id: thread_id.into(),
                },
            ))
            .await
            .unwrap();
        assert_eq!(
            h.platform.last_response(interaction_id),
            Some(Reply::text("Post not found").ephemeral())
        );
    }
    assert!(h.suggestions.added().is_empty());
}

#[tokio::test]
async fn test_add_when_post_lookup_fails() {
    let h = Harness::new().await;
    h.platform.insert_thread(
        thread("4002", SUGGESTIONS_FORUM, "10"),
        "Seasonal roles",
        "hazel",
    );
    h.platform.fail_fetches.store(true, Ordering::SeqCst);

    h.bot
        .dispatch(edit("1", EditSuggestionCommand::Add { id: "4002".into() }))
        .await
        .unwrap();

    assert_eq!(
        h.platform.last_response("1"),
        Some(Reply::text("Failed to request suggestion.").ephemeral())
    );
    assert!(h.suggestions.added().is_empty());
}

#[tokio::test]
async fn test_view_and_message_lookups() {
    let h = Harness::new().await;
    seed_user_suggestions(&h);

    h.bot
        .dispatch(get(
            "1",
            GetSuggestionCommand::View {
                id: 3,
                hidden: false,
            },
        ))
        .await
        .unwrap();
    assert_eq!(
        h.platform.calls()[0],
        PlatformCall::DeferReply {
            interaction_id: "1".into(),
            ephemeral: false,
        }
    );
    assert_eq!(title(&h.platform.last_response("1").unwrap()), "Suggestion #3");

    h.bot
        .dispatch(get(
            "2",
            GetSuggestionCommand::Message {
                id: "t2".into(),
                hidden: true,
            },
        ))
        .await
        .unwrap();
    assert_eq!(title(&h.platform.last_response("2").unwrap()), "Suggestion #2");

    h.bot
        .dispatch(get(
            "3",
            GetSuggestionCommand::View {
                id: 50,
                hidden: true,
            },
        ))
        .await
        .unwrap();
    assert_eq!(
        h.platform.last_response("3"),
        Some(Reply::text("Invalid suggestion ID.").ephemeral())
    );
}

#[tokio::test]
async fn test_view_of_deleted_post_has_unknown_origin() {
    let h = Harness::new().await;
    h.suggestions.insert(stored(9, "42", "gone"));

    h.bot
        .dispatch(get(
            "1",
            GetSuggestionCommand::View {
                id: 9,
                hidden: true,
            },
        ))
        .await
        .unwrap();

    let reply = h.platform.last_response("1").unwrap();
    assert_eq!(
        reply.embeds[0].description.as_deref(),
        Some("Origin of suggestion is unknown.")
    );
}

#[tokio::test]
async fn test_lookups_with_unreachable_posts() {
    let h = Harness::new().await;
    seed_user_suggestions(&h);
    h.platform.fail_fetches.store(true, Ordering::SeqCst);

    h.bot
        .dispatch(get(
            "1",
            GetSuggestionCommand::View {
                id: 1,
                hidden: false,
            },
        ))
        .await
        .unwrap();
    h.bot
        .dispatch(get(
            "2",
            GetSuggestionCommand::User {
                user: "42".into(),
                hidden: true,
            },
        ))
        .await
        .unwrap();

    for interaction_id in ["1", "2"] {
        assert_eq!(
            h.platform.last_response(interaction_id),
            Some(Reply::text("Failed to fetch suggestion.").ephemeral())
        );
    }
    assert!(h.bot.sessions.is_empty());
}

#[tokio::test]
async fn test_user_without_suggestions() {
    let h = Harness::new().await;

    h.bot
        .dispatch(get(
            "1",
            GetSuggestionCommand::User {
                user: "42".into(),
                hidden: true,
            },
        ))
        .await
        .unwrap();

    assert_eq!(
        h.platform.last_response("1"),
        Some(Reply::text("User has no suggestions.").ephemeral())
    );
    assert!(h.bot.sessions.is_empty());
}

#[tokio::test]
async fn test_user_menu_pages_through_suggestions() {
    let h = Harness::new().await;
    seed_user_suggestions(&h);

    h.bot
        .dispatch(get(
            "77",
            GetSuggestionCommand::User {
                user: "42".into(),
                hidden: true,
            },
        ))
        .await
        .unwrap();
    let first = h.platform.last_response("77").unwrap();
    assert_eq!(title(&first), "Suggestion #1");
    assert_eq!(first.buttons[0].custom_id, "left-77");
    assert_eq!(first.buttons[1].custom_id, "right-77");
    assert_eq!(buttons_disabled(&first), vec![true, false]);

    h.bot.dispatch(press("78", "right-77")).await.unwrap();
    assert!(
        h.platform
            .calls()
            .contains(&PlatformCall::DeferUpdate {
                interaction_id: "78".into()
            })
    );
    let second = h.platform.last_response("78").unwrap();
    assert_eq!(title(&second), "Suggestion #2");
    assert_eq!(buttons_disabled(&second), vec![false, false]);

    h.bot.dispatch(press("79", "right-77")).await.unwrap();
    let third = h.platform.last_response("79").unwrap();
    assert_eq!(title(&third), "Suggestion #3");
    assert_eq!(buttons_disabled(&third), vec![false, true]);

    // Past the end the menu stays on the last page.
    h.bot.dispatch(press("80", "right-77")).await.unwrap();
    assert_eq!(title(&h.platform.last_response("80").unwrap()), "Suggestion #3");
    assert_eq!(h.bot.sessions.index_of("77"), Some(2));

    h.bot.dispatch(press("81", "left-77")).await.unwrap();
    assert_eq!(title(&h.platform.last_response("81").unwrap()), "Suggestion #2");
}

#[tokio::test]
async fn test_failed_page_render_keeps_position() {
    let h = Harness::new().await;
    seed_user_suggestions(&h);
    h.bot
        .dispatch(get(
            "77",
            GetSuggestionCommand::User {
                user: "42".into(),
                hidden: true,
            },
        ))
        .await
        .unwrap();

    h.platform.fail_fetches.store(true, Ordering::SeqCst);
    h.bot.dispatch(press("78", "right-77")).await.unwrap();

    assert_eq!(
        h.platform.last_response("78"),
        Some(Reply::text("Failed to fetch suggestion.").ephemeral())
    );
    assert_eq!(h.bot.sessions.index_of("77"), Some(0));

    h.platform.fail_fetches.store(false, Ordering::SeqCst);
    h.bot.dispatch(press("79", "right-77")).await.unwrap();
    assert_eq!(title(&h.platform.last_response("79").unwrap()), "Suggestion #2");
}

#[tokio::test]
async fn test_button_on_unknown_menu() {
    let h = Harness::new().await;

    h.bot.dispatch(press("5", "right-404")).await.unwrap();

    assert_eq!(
        h.platform.last_response("5"),
        Some(Reply::text("This menu has expired.").ephemeral())
    );
}

#[tokio::test(start_paused = true)]
async fn test_idle_menu_expires() {
    let h = Harness::new().await;
    seed_user_suggestions(&h);

    h.bot
        .dispatch(get(
            "77",
            GetSuggestionCommand::User {
                user: "42".into(),
                hidden: true,
            },
        ))
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(901)).await;

    h.bot.dispatch(press("78", "right-77")).await.unwrap();

    assert_eq!(
        h.platform.last_response("78"),
        Some(Reply::text("This menu has expired.").ephemeral())
    );
    assert!(h.bot.sessions.is_empty());
}
