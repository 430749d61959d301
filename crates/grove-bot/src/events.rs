// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Incoming platform events.
//!
//! Events are JSON objects tagged by `type`, one per line on the bridge. Slash
//! commands nest a second tag (`name`) for the command and a third
//! (`subcommand`) for its subcommand:
//!
//! ```json
//! {"type":"member_removed","member":{"id":"42","tag":"hazel","display_name":"Hazel"}}
//! {"type":"command","interaction":{"id":"7","token":"t"},
//!  "command":{"name":"editbugs","subcommand":"add","id":"1001"}}
//! ```

use grove_core::leave::MemberRef;
use serde::{Deserialize, Serialize};

use crate::platform::{InteractionRef, ThreadInfo};
use crate::suggestions::ApprovalState;

/// One event from the platform gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotEvent {
    /// A member joined the guild and entered screening.
    MemberJoined {
        /// Who joined
        member: MemberRef,
    },
    /// A member is no longer in the guild.
    MemberRemoved {
        /// Who left
        member: MemberRef,
    },
    /// A user was banned.
    BanAdded {
        /// Banned user
        user: MemberRef,
        /// Ban reason
        #[serde(default)]
        reason: Option<String>,
    },
    /// A member's roles changed.
    MemberUpdated {
        /// Member after the change
        member: MemberRef,
        /// Role ids before
        #[serde(default)]
        old_roles: Vec<String>,
        /// Role ids after
        #[serde(default)]
        new_roles: Vec<String>,
    },
    /// A message was posted.
    MessageCreated {
        /// The message
        message: IncomingMessage,
    },
    /// A thread was created.
    ThreadCreated {
        /// The thread
        thread: ThreadInfo,
    },
    /// A reaction was added to a message.
    ReactionAdded {
        /// The reaction
        reaction: ReactionEvent,
    },
    /// A reaction was removed from a message.
    ReactionRemoved {
        /// The reaction
        reaction: ReactionEvent,
    },
    /// A slash command was invoked.
    Command {
        /// Interaction to answer
        interaction: InteractionRef,
        /// Parsed command
        command: Command,
    },
    /// A message button was pressed.
    Button {
        /// Interaction to answer
        interaction: InteractionRef,
        /// Id of the pressed button
        custom_id: String,
    },
}

impl BotEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MemberJoined { .. } => "member_joined",
            Self::MemberRemoved { .. } => "member_removed",
            Self::BanAdded { .. } => "ban_added",
            Self::MemberUpdated { .. } => "member_updated",
            Self::MessageCreated { .. } => "message_created",
            Self::ThreadCreated { .. } => "thread_created",
            Self::ReactionAdded { .. } => "reaction_added",
            Self::ReactionRemoved { .. } => "reaction_removed",
            Self::Command { .. } => "command",
            Self::Button { .. } => "button",
        }
    }
}

/// A posted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Message id
    pub id: String,
    /// Channel id
    pub channel_id: String,
    /// Author user id
    pub author_id: String,
    /// Posted by the platform itself (join notices and the like)
    #[serde(default)]
    pub system: bool,
}

/// A reaction change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    /// Message reacted to
    pub message_id: String,
    /// Reacting user
    pub user_id: String,
    /// Emoji name
    pub emoji: String,
}

/// Slash commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum Command {
    /// `/editbugs`
    EditBugs(BugCommand),
    /// `/editsuggestions`
    EditSuggestions(EditSuggestionCommand),
    /// `/getsuggestions`
    GetSuggestions(GetSuggestionCommand),
}

/// `/editbugs` subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "subcommand", rename_all = "snake_case")]
pub enum BugCommand {
    /// Mark a message as a bug report.
    Add {
        /// Message id
        id: String,
    },
    /// Remove a bug report.
    Fixed {
        /// Message id
        id: String,
    },
}

/// `/editsuggestions` subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "subcommand", rename_all = "snake_case")]
pub enum EditSuggestionCommand {
    /// Set a suggestion's approval state.
    State {
        /// Suggestion id
        id: u64,
        /// New state
        state: ApprovalState,
    },
    /// Delete a suggestion.
    Delete {
        /// Suggestion id
        id: u64,
    },
    /// Register an existing forum post as a suggestion.
    Add {
        /// Thread id
        id: String,
    },
}

fn hidden_by_default() -> bool {
    true
}

/// `/getsuggestions` subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "subcommand", rename_all = "snake_case")]
pub enum GetSuggestionCommand {
    /// One suggestion by id.
    View {
        /// Suggestion id
        id: u64,
        /// Ephemeral reply
        #[serde(default = "hidden_by_default")]
        hidden: bool,
    },
    /// All suggestions by a user, paginated.
    User {
        /// User id
        user: String,
        /// Ephemeral reply
        #[serde(default = "hidden_by_default")]
        hidden: bool,
    },
    /// The suggestion created from a message.
    Message {
        /// Message id
        id: String,
        /// Ephemeral reply
        #[serde(default = "hidden_by_default")]
        hidden: bool,
    },
}

impl GetSuggestionCommand {
    /// Whether the reply is ephemeral.
    pub fn hidden(&self) -> bool {
        match self {
            Self::View { hidden, .. }
            | Self::User { hidden, .. }
            | Self::Message { hidden, .. } => *hidden,
        }
    }
}
