// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Suggestion service model and rendering.
//!
//! The service stores suggestions keyed by a numeric id. Approval states are
//! 0-based indices in fetch results and 1-based ids in update requests and
//! responses; [`ApprovalState`] hides both encodings.

pub mod client;
pub mod mock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::{COLOR_GREEN, COLOR_RED, Embed, EmbedField, MessageInfo};

pub use client::{HttpSuggestionService, SuggestionService};
pub use mock::MockSuggestions;

/// Characters of the origin message shown in a suggestion embed.
const EXCERPT_CHARS: usize = 29;

/// Errors from the suggestion service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SuggestionError {
    /// The service reported 404 for the id or path.
    #[error("Suggestion not found")]
    NotFound,

    /// The service answered with another error status.
    #[error("Suggestion service returned {status} {reason}")]
    Failed {
        /// Status code
        status: u16,
        /// Status text
        reason: String,
    },

    /// The request never produced a response.
    #[error("Suggestion service unreachable: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("Unexpected suggestion service response: {0}")]
    Decode(String),
}

impl SuggestionError {
    /// Status code and text for moderator failure reports.
    pub fn status_line(&self) -> (String, String) {
        match self {
            Self::NotFound => ("404".to_string(), "Not Found".to_string()),
            Self::Failed { status, reason } => (status.to_string(), reason.clone()),
            Self::Transport(details) => ("none".to_string(), details.clone()),
            Self::Decode(details) => ("200".to_string(), details.clone()),
        }
    }
}

/// Result type for suggestion service calls.
pub type Result<T> = std::result::Result<T, SuggestionError>;

/// Moderation state of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// Not reviewed yet.
    Pending,
    /// Accepted.
    Approved,
    /// Accepted and shipped.
    Implemented,
    /// Partly accepted.
    PartiallyApproved,
    /// Partly shipped.
    PartiallyImplemented,
    /// Rejected.
    Denied,
    /// Already suggested.
    Duplicate,
}

impl ApprovalState {
    /// All states in index order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Approved,
        Self::Implemented,
        Self::PartiallyApproved,
        Self::PartiallyImplemented,
        Self::Denied,
        Self::Duplicate,
    ];

    /// State for a 0-based index as found in fetch results.
    pub fn from_index(index: u64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// State for a 1-based id as used by updates.
    pub fn from_wire_id(id: u64) -> Option<Self> {
        id.checked_sub(1).and_then(Self::from_index)
    }

    /// 0-based index.
    pub fn index(self) -> u64 {
        self as u64
    }

    /// 1-based id sent to the service.
    pub fn wire_id(self) -> u64 {
        self.index() + 1
    }

    /// Label shown in embeds.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending :alarm_clock:",
            Self::Approved => "Approved :white_check_mark:",
            Self::Implemented => "Implemented :white_check_mark:",
            Self::PartiallyApproved => "Partially Approved :white_check_mark:",
            Self::PartiallyImplemented => "Partially Implemented :white_check_mark:",
            Self::Denied => "Denied :no_entry:",
            Self::Duplicate => "Duplicate :no_entry:",
        }
    }

    /// Embed colour: red once rejected, green once past pending.
    pub fn color(self) -> Option<u32> {
        match self {
            Self::Denied | Self::Duplicate => Some(COLOR_RED),
            Self::Pending => None,
            _ => Some(COLOR_GREEN),
        }
    }
}

/// A stored suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Suggestion id
    pub id: u64,
    /// Author user id
    pub author_id: String,
    /// Starter message (and thread) id of the forum post
    pub message_id: String,
    /// Current state
    pub state: ApprovalState,
}

/// Body of an `add` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSuggestion {
    /// Post creator id
    pub creator_id: String,
    /// Thread id
    pub thread_id: String,
    /// Thread title
    pub title: String,
    /// Starter message content
    pub content: String,
    /// Post creator account name
    pub creator_name: String,
}

/// `[content](url)`, shortened to the first 29 characters plus `...`.
pub fn excerpt(message: &MessageInfo) -> String {
    if message.content.chars().count() < EXCERPT_CHARS {
        format!("[{}]({})", message.content, message.url)
    } else {
        let head: String = message.content.chars().take(EXCERPT_CHARS).collect();
        format!("[{}...]({})", head, message.url)
    }
}

/// Embed describing `suggestion` under `title`.
///
/// `origin` is the forum post the suggestion came from, when it still exists.
pub fn suggestion_embed(
    title: String,
    suggestion: &Suggestion,
    origin: Option<&MessageInfo>,
) -> Embed {
    Embed {
        title: Some(title),
        description: Some(match origin {
            Some(message) => excerpt(message),
            None => "Origin of suggestion is unknown.".to_string(),
        }),
        fields: vec![
            EmbedField {
                name: "Author:".to_string(),
                value: format!("<@{}>", suggestion.author_id),
            },
            EmbedField {
                name: "Approval State:".to_string(),
                value: suggestion.state.label().to_string(),
            },
        ],
        color: suggestion.state.color(),
    }
}
