// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Discord REST implementation of [`ChatPlatform`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grove_core::leave::KickEntry;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{
    Button, ChatPlatform, Embed, InteractionRef, MessageInfo, PlatformError, Reply, Result,
    ThreadInfo,
};

const API_BASE: &str = "https://discord.com/api/v10";
const WEB_BASE: &str = "https://discord.com/channels";

/// Milliseconds between the Unix epoch and the first snowflake.
const SNOWFLAKE_EPOCH_MS: u64 = 1_420_070_400_000;

/// Audit log action type for member kicks.
const MEMBER_KICK: u8 = 20;

const EPHEMERAL_FLAG: u64 = 1 << 6;

// Interaction callback types
const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;
const DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE: u8 = 5;
const DEFERRED_UPDATE_MESSAGE: u8 = 6;

const ERROR_BODY_LIMIT: usize = 512;

/// Discord REST API client.
pub struct DiscordRest {
    client: Client,
    base_url: String,
    token: String,
    application_id: String,
    guild_id: String,
}

impl DiscordRest {
    /// Create a client authenticating as the bot `token`.
    pub fn new(
        token: impl Into<String>,
        application_id: impl Into<String>,
        guild_id: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("grove-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| PlatformError::Transport {
                route: "client setup".to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: API_BASE.to_string(),
            token: token.into(),
            application_id: application_id.into(),
            guild_id: guild_id.into(),
        })
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let route = format!("{method} {path}");
        let mut request = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, format!("Bot {}", self.token));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| PlatformError::Transport {
                route: route.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(route = %route, status = status.as_u16(), "Platform call succeeded");
            return Ok(response);
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > ERROR_BODY_LIMIT {
            let cut = (0..=ERROR_BODY_LIMIT)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        Err(PlatformError::Http {
            route,
            status: status.as_u16(),
            body,
        })
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<()> {
        self.call(method, path, Some(body)).await.map(|_| ())
    }

    async fn send_empty(&self, method: Method, path: &str) -> Result<()> {
        self.call::<()>(method, path, None).await.map(|_| ())
    }

    /// GET `path`, mapping 404 to `None`.
    async fn lookup<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let response = match self.call::<()>(Method::GET, path, None).await {
            Ok(response) => response,
            Err(PlatformError::Http { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| PlatformError::Decode {
                route: format!("GET {path}"),
                details: e.to_string(),
            })
    }

    fn message_info(&self, message: WireMessage) -> MessageInfo {
        MessageInfo {
            url: format!(
                "{WEB_BASE}/{}/{}/{}",
                self.guild_id, message.channel_id, message.id
            ),
            id: message.id,
            channel_id: message.channel_id,
            author_id: message.author.id,
            author_name: message.author.username,
            content: message.content,
        }
    }

    fn webhook_path(&self, interaction: &InteractionRef) -> String {
        format!(
            "/webhooks/{}/{}/messages/@original",
            self.application_id, interaction.token
        )
    }
}

#[async_trait]
impl ChatPlatform for DiscordRest {
    #[instrument(skip(self, content))]
    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()> {
        let body = MessagePayload {
            content: Some(content),
            ..MessagePayload::default()
        };
        self.send_json(Method::POST, &format!("/channels/{channel_id}/messages"), &body)
            .await
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<MessageInfo>> {
        let message: Option<WireMessage> = self
            .lookup(&format!("/channels/{channel_id}/messages/{message_id}"))
            .await?;
        Ok(message.map(|m| self.message_info(m)))
    }

    async fn fetch_starter_message(&self, thread_id: &str) -> Result<Option<MessageInfo>> {
        // Forum starter messages share the id of their thread.
        self.fetch_message(thread_id, thread_id).await
    }

    async fn fetch_thread(&self, thread_id: &str) -> Result<Option<ThreadInfo>> {
        let channel: Option<WireChannel> = self.lookup(&format!("/channels/{thread_id}")).await?;
        Ok(channel.and_then(|c| {
            Some(ThreadInfo {
                parent_id: c.parent_id?,
                owner_id: c.owner_id?,
                name: c.name.unwrap_or_default(),
                id: c.id,
            })
        }))
    }

    async fn guild_owner(&self, guild_id: &str) -> Result<String> {
        let path = format!("/guilds/{guild_id}");
        let guild: Option<WireGuild> = self.lookup(&path).await?;
        guild
            .map(|g| g.owner_id)
            .ok_or_else(|| PlatformError::Decode {
                route: format!("GET {path}"),
                details: "guild not found".to_string(),
            })
    }

    async fn latest_kick(&self, guild_id: &str) -> Result<Option<KickEntry>> {
        let path = format!("/guilds/{guild_id}/audit-logs?action_type={MEMBER_KICK}&limit=1");
        let log: Option<WireAuditLog> = self.lookup(&path).await?;
        let Some(entry) = log.and_then(|l| l.audit_log_entries.into_iter().next()) else {
            return Ok(None);
        };
        let created_at = snowflake_timestamp(&entry.id).ok_or_else(|| PlatformError::Decode {
            route: format!("GET {path}"),
            details: format!("invalid audit log entry id '{}'", entry.id),
        })?;
        Ok(entry.target_id.map(|target_id| KickEntry {
            target_id,
            reason: entry.reason,
            created_at,
        }))
    }

    async fn add_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<()> {
        self.send_empty(
            Method::PUT,
            &format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}"),
        )
        .await
    }

    async fn remove_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}"),
        )
        .await
    }

    async fn reply(&self, interaction: &InteractionRef, reply: &Reply) -> Result<()> {
        let body = InteractionCallback {
            kind: CHANNEL_MESSAGE_WITH_SOURCE,
            data: Some(MessagePayload::from_reply(reply)),
        };
        self.send_json(
            Method::POST,
            &format!("/interactions/{}/{}/callback", interaction.id, interaction.token),
            &body,
        )
        .await
    }

    async fn defer_reply(&self, interaction: &InteractionRef, ephemeral: bool) -> Result<()> {
        let body = InteractionCallback {
            kind: DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE,
            data: Some(MessagePayload {
                flags: ephemeral.then_some(EPHEMERAL_FLAG),
                ..MessagePayload::default()
            }),
        };
        self.send_json(
            Method::POST,
            &format!("/interactions/{}/{}/callback", interaction.id, interaction.token),
            &body,
        )
        .await
    }

    async fn defer_update(&self, interaction: &InteractionRef) -> Result<()> {
        let body = InteractionCallback {
            kind: DEFERRED_UPDATE_MESSAGE,
            data: None,
        };
        self.send_json(
            Method::POST,
            &format!("/interactions/{}/{}/callback", interaction.id, interaction.token),
            &body,
        )
        .await
    }

    async fn edit_reply(&self, interaction: &InteractionRef, reply: &Reply) -> Result<()> {
        let mut body = MessagePayload::from_reply(reply);
        // Edits only touch fields that are present; clear what the reply lacks.
        body.content.get_or_insert("");
        body.embeds.get_or_insert_with(Vec::new);
        body.components.get_or_insert_with(Vec::new);
        self.send_json(Method::PATCH, &self.webhook_path(interaction), &body)
            .await
    }
}

/// Creation time encoded in a snowflake id.
pub fn snowflake_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let raw: u64 = id.parse().ok()?;
    let millis = (raw >> 22).checked_add(SNOWFLAKE_EPOCH_MS)?;
    DateTime::from_timestamp_millis(i64::try_from(millis).ok()?)
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Deserialize)]
struct WireUser {
    id: String,
    username: String,
}

#[derive(Deserialize)]
struct WireMessage {
    id: String,
    channel_id: String,
    #[serde(default)]
    content: String,
    author: WireUser,
}

#[derive(Deserialize)]
struct WireChannel {
    id: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    owner_id: Option<String>,
}

#[derive(Deserialize)]
struct WireGuild {
    owner_id: String,
}

#[derive(Deserialize)]
struct WireAuditLog {
    #[serde(default)]
    audit_log_entries: Vec<WireAuditEntry>,
}

#[derive(Deserialize)]
struct WireAuditEntry {
    id: String,
    #[serde(default)]
    target_id: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Serialize)]
struct InteractionCallback<'a> {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<MessagePayload<'a>>,
}

#[derive(Serialize, Default)]
struct MessagePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embeds: Option<Vec<WireEmbed<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    components: Option<Vec<ActionRow<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<u64>,
}

impl<'a> MessagePayload<'a> {
    fn from_reply(reply: &'a Reply) -> Self {
        Self {
            content: reply.content.as_deref(),
            embeds: (!reply.embeds.is_empty())
                .then(|| reply.embeds.iter().map(WireEmbed::from).collect()),
            components: (!reply.buttons.is_empty()).then(|| {
                vec![ActionRow {
                    kind: 1,
                    components: reply.buttons.iter().map(WireButton::from).collect(),
                }]
            }),
            flags: reply.ephemeral.then_some(EPHEMERAL_FLAG),
        }
    }
}

#[derive(Serialize)]
struct WireEmbed<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<WireField<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<u32>,
}

impl<'a> From<&'a Embed> for WireEmbed<'a> {
    fn from(embed: &'a Embed) -> Self {
        Self {
            title: embed.title.as_deref(),
            description: embed.description.as_deref(),
            fields: embed
                .fields
                .iter()
                .map(|f| WireField {
                    name: &f.name,
                    value: &f.value,
                })
                .collect(),
            color: embed.color,
        }
    }
}

#[derive(Serialize)]
struct WireField<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct ActionRow<'a> {
    #[serde(rename = "type")]
    kind: u8,
    components: Vec<WireButton<'a>>,
}

#[derive(Serialize)]
struct WireButton<'a> {
    #[serde(rename = "type")]
    kind: u8,
    style: u8,
    custom_id: &'a str,
    emoji: WireEmoji<'a>,
    disabled: bool,
}

impl<'a> From<&'a Button> for WireButton<'a> {
    fn from(button: &'a Button) -> Self {
        Self {
            kind: 2,
            // Secondary (grey)
            style: 2,
            custom_id: &button.custom_id,
            emoji: WireEmoji {
                name: &button.emoji,
            },
            disabled: button.disabled,
        }
    }
}

#[derive(Serialize)]
struct WireEmoji<'a> {
    name: &'a str,
}
