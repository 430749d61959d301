// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared helpers for grove-bot integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use grove_bot::platform::{InteractionRef, MessageInfo, MockPlatform, ThreadInfo};
use grove_bot::suggestions::MockSuggestions;
use grove_bot::{Bot, Config};
use grove_core::leave::MemberRef;
use tempfile::TempDir;

pub const GUILD: &str = "100";
pub const GUILD_OWNER: &str = "500";
pub const SUGGESTIONS_FORUM: &str = "suggestions-forum";
pub const BUG_FORUM: &str = "bug-forum";
pub const WELCOMES: &str = "welcomes";
pub const SYSTEM_WELCOMES: &str = "system-welcomes";
pub const LOG: &str = "mod-log";
pub const NITRO: &str = "nitro";
pub const NITRO_ROLE: &str = "booster";

pub fn config(dir: &Path) -> Config {
    Config {
        token: "token".to_string(),
        application_id: "app".to_string(),
        guild_id: GUILD.to_string(),
        suggestions_channel: SUGGESTIONS_FORUM.to_string(),
        bug_reports_channel: BUG_FORUM.to_string(),
        welcomes_channel: WELCOMES.to_string(),
        system_welcomes_channel: SYSTEM_WELCOMES.to_string(),
        log_channel: LOG.to_string(),
        nitro_channel: NITRO.to_string(),
        nitro_role: NITRO_ROLE.to_string(),
        suggestions_host: "http://suggestions.test".to_string(),
        suggestions_auth: "secret".to_string(),
        guild_name: "the Witch's Grove".to_string(),
        data_dir: dir.to_path_buf(),
        reaction_roles_path: dir.join("reaction-roles.json"),
        leave_debounce: Duration::from_millis(1500),
        kick_window: Duration::from_secs(3),
        session_idle: Some(Duration::from_secs(900)),
    }
}

/// A bot wired to mock collaborators, with its state in a temp directory.
pub struct Harness {
    pub bot: Arc<Bot>,
    pub platform: Arc<MockPlatform>,
    pub suggestions: Arc<MockSuggestions>,
    pub dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let platform = Arc::new(MockPlatform::new(GUILD_OWNER));
        let suggestions = Arc::new(MockSuggestions::new());
        let bot = Bot::load(config(dir.path()), platform.clone(), suggestions.clone())
            .await
            .unwrap();
        Self {
            bot,
            platform,
            suggestions,
            dir,
        }
    }

    /// Ids stored in one of the durable set files.
    pub fn stored_ids(&self, file: &str) -> Vec<String> {
        match std::fs::read(self.dir.path().join(file)) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap(),
            Err(_) => Vec::new(),
        }
    }
}

pub fn member(id: &str) -> MemberRef {
    MemberRef {
        id: id.to_string(),
        tag: format!("user{id}"),
        display_name: Some(format!("Nick{id}")),
    }
}

pub fn interaction(id: &str) -> InteractionRef {
    InteractionRef {
        id: id.to_string(),
        token: format!("token-{id}"),
    }
}

pub fn thread(id: &str, parent: &str, owner: &str) -> ThreadInfo {
    ThreadInfo {
        id: id.to_string(),
        parent_id: parent.to_string(),
        name: format!("Post {id}"),
        owner_id: owner.to_string(),
    }
}

pub fn message(channel: &str, id: &str, content: &str) -> MessageInfo {
    MessageInfo {
        id: id.to_string(),
        channel_id: channel.to_string(),
        author_id: "10".to_string(),
        author_name: "hazel".to_string(),
        content: content.to_string(),
        url: format!("https://discord.test/{channel}/{id}"),
    }
}
