// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bug-report forum posts and `/editbugs`.

mod common;

use common::*;
use grove_bot::BotEvent;
use grove_bot::events::{BugCommand, Command};
use grove_bot::platform::Reply;
use grove_bot::platform::mock::PlatformCall;

fn editbugs(interaction_id: &str, command: BugCommand) -> BotEvent {
    BotEvent::Command {
        interaction: interaction(interaction_id),
        command: Command::EditBugs(command),
    }
}

fn last_text(h: &Harness, interaction_id: &str) -> String {
    h.platform
        .last_response(interaction_id)
        .and_then(|reply| reply.content)
        .unwrap()
}

#[tokio::test]
async fn test_bug_forum_post_is_greeted_and_tracked() {
    let h = Harness::new().await;

    h.bot
        .dispatch(BotEvent::ThreadCreated {
            thread: thread("3000", BUG_FORUM, "10"),
        })
        .await
        .unwrap();

    assert_eq!(
        h.platform.messages_in("3000"),
        vec!["Bug report created by <@10>.\n(Adding <@500>.)".to_string()]
    );
    assert!(h.bot.bug_reports.contains("3000").await);
    assert_eq!(h.stored_ids("bug-reports.json"), vec!["3000".to_string()]);
}

#[tokio::test]
async fn test_threads_outside_tracked_forums_are_ignored() {
    let h = Harness::new().await;

    h.bot
        .dispatch(BotEvent::ThreadCreated {
            thread: thread("3001", "general", "10"),
        })
        .await
        .unwrap();

    assert!(h.platform.calls().is_empty());
    assert!(h.suggestions.added().is_empty());
    assert!(!h.bot.bug_reports.contains("3001").await);
}

#[tokio::test]
async fn test_add_requires_existing_message() {
    let h = Harness::new().await;

    h.bot
        .dispatch(editbugs("1", BugCommand::Add { id: "404".into() }))
        .await
        .unwrap();

    assert_eq!(
        h.platform.calls()[0],
        PlatformCall::DeferReply {
            interaction_id: "1".into(),
            ephemeral: false,
        }
    );
    assert_eq!(last_text(&h, "1"), "Could not find message.");
    assert!(h.bot.bug_reports.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_add_then_duplicate_then_fixed() {
    let h = Harness::new().await;
    h.platform.insert_message(message(BUG_FORUM, "42", "it crashed"));

    h.bot
        .dispatch(editbugs("1", BugCommand::Add { id: "42".into() }))
        .await
        .unwrap();
    assert_eq!(last_text(&h, "1"), "Message has been marked as a bug report.");
    assert_eq!(h.stored_ids("bug-reports.json"), vec!["42".to_string()]);

    h.bot
        .dispatch(editbugs("2", BugCommand::Add { id: "42".into() }))
        .await
        .unwrap();
    assert_eq!(last_text(&h, "2"), "Message is already a bug report");

    h.bot
        .dispatch(editbugs("3", BugCommand::Fixed { id: "42".into() }))
        .await
        .unwrap();
    assert_eq!(last_text(&h, "3"), "Bug report has been removed.");
    assert!(h.stored_ids("bug-reports.json").is_empty());

    h.bot
        .dispatch(editbugs("4", BugCommand::Fixed { id: "42".into() }))
        .await
        .unwrap();
    assert_eq!(last_text(&h, "4"), "Message is not a bug report.");
}

#[tokio::test]
async fn test_failed_write_is_reported_and_rolled_back() {
    let h = Harness::new().await;
    h.platform.insert_message(message(BUG_FORUM, "42", "it crashed"));
    std::fs::remove_dir_all(h.dir.path()).unwrap();

    h.bot
        .dispatch(editbugs("1", BugCommand::Add { id: "42".into() }))
        .await
        .unwrap();

    assert_eq!(last_text(&h, "1"), "Failed to update bug reports.");
    assert!(!h.bot.bug_reports.contains("42").await);
}

#[tokio::test]
async fn test_add_when_message_lookup_fails() {
    let h = Harness::new().await;
    h.platform.insert_message(message(BUG_FORUM, "42", "it crashed"));
    h.platform
        .fail_fetches
        .store(true, std::sync::atomic::Ordering::SeqCst);

    h.bot
        .dispatch(editbugs("1", BugCommand::Add { id: "42".into() }))
        .await
        .unwrap();

    assert_eq!(
        h.platform.last_response("1"),
        Some(Reply::text("Failed to update bug reports.").ephemeral())
    );
    assert!(!h.bot.bug_reports.contains("42").await);
}

#[tokio::test]
async fn test_concurrent_commands_all_persist() {
    let h = Harness::new().await;
    for i in 0..16 {
        h.platform
            .insert_message(message(BUG_FORUM, &format!("m{i}"), "broken"));
    }

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let bot = h.bot.clone();
            tokio::spawn(async move {
                bot.dispatch(editbugs(&format!("i{i}"), BugCommand::Add { id: format!("m{i}") }))
                    .await
            })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let mut stored = h.stored_ids("bug-reports.json");
    stored.sort();
    let mut expected: Vec<String> = (0..16).map(|i| format!("m{i}")).collect();
    expected.sort();
    assert_eq!(stored, expected);
}
