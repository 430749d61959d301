// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Chat platform abstraction.
//!
//! Handlers talk to the platform only through [`ChatPlatform`]. The production
//! implementation is [`discord::DiscordRest`]; tests use [`mock::MockPlatform`].

pub mod discord;
pub mod mock;

use async_trait::async_trait;
use grove_core::leave::KickEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use discord::DiscordRest;
pub use mock::MockPlatform;

/// Embed colour for denied or duplicate suggestions.
pub const COLOR_RED: u32 = 0xFF0000;
/// Embed colour for accepted suggestions.
pub const COLOR_GREEN: u32 = 0x00FF00;

/// Errors from platform calls.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlatformError {
    /// The platform answered with a non-success status.
    #[error("HTTP {status} from {route}: {body}")]
    Http {
        /// Request route
        route: String,
        /// Response status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// The request never produced a response.
    #[error("Request to {route} failed: {source}")]
    Transport {
        /// Request route
        route: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from {route}: {details}")]
    Decode {
        /// Request route
        route: String,
        /// What went wrong
        details: String,
    },
}

/// Result type for platform calls.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// A message as needed by the handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    /// Message id
    pub id: String,
    /// Channel (or thread) the message lives in
    pub channel_id: String,
    /// Author user id
    pub author_id: String,
    /// Author account name
    pub author_name: String,
    /// Text content
    #[serde(default)]
    pub content: String,
    /// Jump link
    pub url: String,
}

/// A forum post thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    /// Thread id, which is also the id of its starter message
    pub id: String,
    /// Forum channel the thread belongs to
    pub parent_id: String,
    /// Thread title
    pub name: String,
    /// Creator user id
    pub owner_id: String,
}

/// The interaction a reply belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRef {
    /// Interaction id
    pub id: String,
    /// Continuation token for replies and edits
    pub token: String,
}

/// One embed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field label
    pub name: String,
    /// Field value
    pub value: String,
}

/// A rich embed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Title line
    pub title: Option<String>,
    /// Body text
    pub description: Option<String>,
    /// Labelled fields
    pub fields: Vec<EmbedField>,
    /// Side colour
    pub color: Option<u32>,
}

impl Embed {
    /// Embed with only a description.
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }
}

/// A button in a reply's action row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Id echoed back when the button is pressed
    pub custom_id: String,
    /// Emoji label
    pub emoji: String,
    /// Greyed out
    pub disabled: bool,
}

/// Response content for an interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Plain text
    pub content: Option<String>,
    /// Embeds
    pub embeds: Vec<Embed>,
    /// One action row of buttons
    pub buttons: Vec<Button>,
    /// Only visible to the invoking user
    pub ephemeral: bool,
}

impl Reply {
    /// Plain text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Reply carrying one embed.
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    /// Make the reply ephemeral.
    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    /// Attach buttons.
    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// Platform operations used by the bot.
///
/// Lookups return `Ok(None)` when the platform reports the target does not
/// exist; every other failure is an error.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Post a text message to a channel or thread.
    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()>;

    /// Fetch a message from a channel.
    async fn fetch_message(&self, channel_id: &str, message_id: &str)
    -> Result<Option<MessageInfo>>;

    /// Fetch the first message of a forum thread.
    async fn fetch_starter_message(&self, thread_id: &str) -> Result<Option<MessageInfo>>;

    /// Fetch a thread by id.
    async fn fetch_thread(&self, thread_id: &str) -> Result<Option<ThreadInfo>>;

    /// User id of the guild owner.
    async fn guild_owner(&self, guild_id: &str) -> Result<String>;

    /// Most recent member-kick entry in the guild audit log.
    async fn latest_kick(&self, guild_id: &str) -> Result<Option<KickEntry>>;

    /// Grant a role.
    async fn add_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<()>;

    /// Revoke a role.
    async fn remove_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<()>;

    /// Answer an interaction immediately.
    async fn reply(&self, interaction: &InteractionRef, reply: &Reply) -> Result<()>;

    /// Acknowledge a command, promising a reply via [`ChatPlatform::edit_reply`].
    async fn defer_reply(&self, interaction: &InteractionRef, ephemeral: bool) -> Result<()>;

    /// Acknowledge a button press on an existing message.
    async fn defer_update(&self, interaction: &InteractionRef) -> Result<()>;

    /// Replace the content of a deferred reply or of the message a button sits on.
    async fn edit_reply(&self, interaction: &InteractionRef, reply: &Reply) -> Result<()>;
}
