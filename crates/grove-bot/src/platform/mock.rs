// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock platform for testing.
//!
//! Serves messages and threads from memory and records every outbound call so
//! tests can assert on what the bot said and did.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use grove_core::leave::KickEntry;

use super::{ChatPlatform, InteractionRef, MessageInfo, PlatformError, Reply, Result, ThreadInfo};

/// An outbound platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    /// Channel message
    Message {
        /// Target channel
        channel_id: String,
        /// Text
        content: String,
    },
    /// Immediate interaction reply
    Reply {
        /// Interaction id
        interaction_id: String,
        /// Content
        reply: Reply,
    },
    /// Deferred command reply
    DeferReply {
        /// Interaction id
        interaction_id: String,
        /// Ephemeral flag
        ephemeral: bool,
    },
    /// Deferred button update
    DeferUpdate {
        /// Interaction id
        interaction_id: String,
    },
    /// Edit of a deferred reply
    EditReply {
        /// Interaction id
        interaction_id: String,
        /// Content
        reply: Reply,
    },
    /// Role granted
    AddRole {
        /// Member
        user_id: String,
        /// Role
        role_id: String,
    },
    /// Role revoked
    RemoveRole {
        /// Member
        user_id: String,
        /// Role
        role_id: String,
    },
}

#[derive(Default)]
struct State {
    calls: Vec<PlatformCall>,
    messages: HashMap<(String, String), MessageInfo>,
    threads: HashMap<String, ThreadInfo>,
    kick: Option<KickEntry>,
}

/// Recording in-memory platform.
pub struct MockPlatform {
    state: Mutex<State>,
    guild_owner: String,
    /// If true, channel messages fail with HTTP 500
    pub fail_sends: AtomicBool,
    /// If true, message and thread lookups fail with HTTP 500
    pub fail_fetches: AtomicBool,
}

impl MockPlatform {
    /// Create a platform whose guild is owned by `guild_owner`.
    pub fn new(guild_owner: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            guild_owner: guild_owner.into(),
            fail_sends: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
        }
    }

    fn fetch_failure(&self, route: String) -> Result<()> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(PlatformError::Http {
                route,
                status: 500,
                body: "mock failure".to_string(),
            });
        }
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: PlatformCall) {
        self.state().calls.push(call);
    }

    /// Make a message fetchable.
    pub fn insert_message(&self, message: MessageInfo) {
        self.state()
            .messages
            .insert((message.channel_id.clone(), message.id.clone()), message);
    }

    /// Make a forum thread and its starter message fetchable.
    pub fn insert_thread(&self, thread: ThreadInfo, starter_content: &str, author_name: &str) {
        let starter = MessageInfo {
            id: thread.id.clone(),
            channel_id: thread.id.clone(),
            author_id: thread.owner_id.clone(),
            author_name: author_name.to_string(),
            content: starter_content.to_string(),
            url: format!("https://discord.test/{}/{}", thread.id, thread.id),
        };
        self.insert_message(starter);
        self.state().threads.insert(thread.id.clone(), thread);
    }

    /// Set the latest audit-log kick.
    pub fn set_kick(&self, kick: Option<KickEntry>) {
        self.state().kick = kick;
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state().calls.clone()
    }

    /// Text posted to `channel_id`, in order.
    pub fn messages_in(&self, channel_id: &str) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::Message {
                    channel_id: c,
                    content,
                } if c == channel_id => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    /// Replies and edits sent for `interaction_id`, in order.
    pub fn responses_to(&self, interaction_id: &str) -> Vec<Reply> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::Reply {
                    interaction_id: i,
                    reply,
                }
                | PlatformCall::EditReply {
                    interaction_id: i,
                    reply,
                } if i == interaction_id => Some(reply.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recent reply or edit for `interaction_id`.
    pub fn last_response(&self, interaction_id: &str) -> Option<Reply> {
        self.responses_to(interaction_id).pop()
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(PlatformError::Http {
                route: format!("POST /channels/{channel_id}/messages"),
                status: 500,
                body: "mock failure".to_string(),
            });
        }
        self.record(PlatformCall::Message {
            channel_id: channel_id.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<MessageInfo>> {
        self.fetch_failure(format!("GET /channels/{channel_id}/messages/{message_id}"))?;
        Ok(self
            .state()
            .messages
            .get(&(channel_id.to_string(), message_id.to_string()))
            .cloned())
    }

    async fn fetch_starter_message(&self, thread_id: &str) -> Result<Option<MessageInfo>> {
        self.fetch_message(thread_id, thread_id).await
    }

    async fn fetch_thread(&self, thread_id: &str) -> Result<Option<ThreadInfo>> {
        self.fetch_failure(format!("GET /channels/{thread_id}"))?;
        Ok(self.state().threads.get(thread_id).cloned())
    }

    async fn guild_owner(&self, _guild_id: &str) -> Result<String> {
        Ok(self.guild_owner.clone())
    }

    async fn latest_kick(&self, _guild_id: &str) -> Result<Option<KickEntry>> {
        Ok(self.state().kick.clone())
    }

    async fn add_role(&self, _guild_id: &str, user_id: &str, role_id: &str) -> Result<()> {
        self.record(PlatformCall::AddRole {
            user_id: user_id.to_string(),
            role_id: role_id.to_string(),
        });
        Ok(())
    }

    async fn remove_role(&self, _guild_id: &str, user_id: &str, role_id: &str) -> Result<()> {
        self.record(PlatformCall::RemoveRole {
            user_id: user_id.to_string(),
            role_id: role_id.to_string(),
        });
        Ok(())
    }

    async fn reply(&self, interaction: &InteractionRef, reply: &Reply) -> Result<()> {
        self.record(PlatformCall::Reply {
            interaction_id: interaction.id.clone(),
            reply: reply.clone(),
        });
        Ok(())
    }

    async fn defer_reply(&self, interaction: &InteractionRef, ephemeral: bool) -> Result<()> {
        self.record(PlatformCall::DeferReply {
            interaction_id: interaction.id.clone(),
            ephemeral,
        });
        Ok(())
    }

    async fn defer_update(&self, interaction: &InteractionRef) -> Result<()> {
        self.record(PlatformCall::DeferUpdate {
            interaction_id: interaction.id.clone(),
        });
        Ok(())
    }

    async fn edit_reply(&self, interaction: &InteractionRef, reply: &Reply) -> Result<()> {
        self.record(PlatformCall::EditReply {
            interaction_id: interaction.id.clone(),
            reply: reply.clone(),
        });
        Ok(())
    }
}
