// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use grove_core::LeaveTrackerConfig;
use serde::Deserialize;

/// Grove bot configuration
#[derive(Clone)]
pub struct Config {
    /// Bot token for the platform REST API
    pub token: String,
    /// Application id, used for interaction follow-ups
    pub application_id: String,
    /// Guild the bot serves
    pub guild_id: String,
    /// Forum channel holding suggestion posts
    pub suggestions_channel: String,
    /// Forum channel holding bug reports
    pub bug_reports_channel: String,
    /// Channel for join and leave announcements
    pub welcomes_channel: String,
    /// Channel where the platform posts its own join messages
    pub system_welcomes_channel: String,
    /// Moderator log channel
    pub log_channel: String,
    /// Channel for boost thanks
    pub nitro_channel: String,
    /// Booster role id
    pub nitro_role: String,
    /// Base URL of the suggestion service
    pub suggestions_host: String,
    /// Shared secret for the suggestion service
    pub suggestions_auth: String,
    /// Guild name used in announcements
    pub guild_name: String,
    /// Directory holding the durable set files
    pub data_dir: PathBuf,
    /// Reaction-role mapping file
    pub reaction_roles_path: PathBuf,
    /// How long a bare member removal waits for a ban or kick
    pub leave_debounce: Duration,
    /// Maximum age of an audit-log kick that still explains a removal
    pub kick_window: Duration,
    /// Idle time after which a paginated session is dropped (`None` keeps them)
    pub session_idle: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `GROVE_TOKEN`, `GROVE_APPLICATION_ID`, `GROVE_GUILD_ID`
    /// - `GROVE_SUGGESTIONS_CHANNEL`, `GROVE_BUG_REPORTS_CHANNEL`
    /// - `GROVE_WELCOMES_CHANNEL`, `GROVE_SYSTEM_WELCOMES_CHANNEL`, `GROVE_LOG_CHANNEL`
    /// - `GROVE_NITRO_CHANNEL`, `GROVE_NITRO_ROLE`
    /// - `GROVE_SUGGESTIONS_HOST`, `GROVE_SUGGESTIONS_AUTH`
    ///
    /// Optional (with defaults):
    /// - `GROVE_GUILD_NAME` (default: the Witch's Grove)
    /// - `GROVE_DATA_DIR` (default: .)
    /// - `GROVE_REACTION_ROLES` (default: reaction-roles.json)
    /// - `GROVE_LEAVE_DEBOUNCE_MS` (default: 1500)
    /// - `GROVE_KICK_WINDOW_MS` (default: 3000)
    /// - `GROVE_SESSION_IDLE_SECS` (default: 900, 0 disables eviction)
    pub fn from_env() -> Result<Self, ConfigError> {
        let leave_debounce_ms = parse_or(
            "GROVE_LEAVE_DEBOUNCE_MS",
            1500,
            "must be a non-negative integer (milliseconds)",
        )?;
        let kick_window_ms = parse_or(
            "GROVE_KICK_WINDOW_MS",
            3000,
            "must be a non-negative integer (milliseconds)",
        )?;
        let session_idle_secs = parse_or(
            "GROVE_SESSION_IDLE_SECS",
            900,
            "must be a non-negative integer (seconds)",
        )?;

        Ok(Self {
            token: required("GROVE_TOKEN")?,
            application_id: required("GROVE_APPLICATION_ID")?,
            guild_id: required("GROVE_GUILD_ID")?,
            suggestions_channel: required("GROVE_SUGGESTIONS_CHANNEL")?,
            bug_reports_channel: required("GROVE_BUG_REPORTS_CHANNEL")?,
            welcomes_channel: required("GROVE_WELCOMES_CHANNEL")?,
            system_welcomes_channel: required("GROVE_SYSTEM_WELCOMES_CHANNEL")?,
            log_channel: required("GROVE_LOG_CHANNEL")?,
            nitro_channel: required("GROVE_NITRO_CHANNEL")?,
            nitro_role: required("GROVE_NITRO_ROLE")?,
            suggestions_host: required("GROVE_SUGGESTIONS_HOST")?
                .trim_end_matches('/')
                .to_string(),
            suggestions_auth: required("GROVE_SUGGESTIONS_AUTH")?,
            guild_name: std::env::var("GROVE_GUILD_NAME")
                .unwrap_or_else(|_| "the Witch's Grove".to_string()),
            data_dir: PathBuf::from(
                std::env::var("GROVE_DATA_DIR").unwrap_or_else(|_| ".".to_string()),
            ),
            reaction_roles_path: PathBuf::from(
                std::env::var("GROVE_REACTION_ROLES")
                    .unwrap_or_else(|_| "reaction-roles.json".to_string()),
            ),
            leave_debounce: Duration::from_millis(leave_debounce_ms),
            kick_window: Duration::from_millis(kick_window_ms),
            session_idle: (session_idle_secs > 0).then(|| Duration::from_secs(session_idle_secs)),
        })
    }

    /// Backing file for tracked bug-report threads.
    pub fn bug_reports_path(&self) -> PathBuf {
        self.data_dir.join("bug-reports.json")
    }

    /// Backing file for members inside membership screening.
    pub fn pending_members_path(&self) -> PathBuf {
        self.data_dir.join("pending-members.json")
    }

    /// Leave tracker timing.
    pub fn leave_tracker(&self) -> LeaveTrackerConfig {
        LeaveTrackerConfig {
            debounce: self.leave_debounce,
            kick_window: self.kick_window,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("application_id", &self.application_id)
            .field("guild_id", &self.guild_id)
            .field("suggestions_channel", &self.suggestions_channel)
            .field("bug_reports_channel", &self.bug_reports_channel)
            .field("welcomes_channel", &self.welcomes_channel)
            .field("system_welcomes_channel", &self.system_welcomes_channel)
            .field("log_channel", &self.log_channel)
            .field("nitro_channel", &self.nitro_channel)
            .field("nitro_role", &self.nitro_role)
            .field("suggestions_host", &self.suggestions_host)
            .field("suggestions_auth", &"<redacted>")
            .field("guild_name", &self.guild_name)
            .field("data_dir", &self.data_dir)
            .field("reaction_roles_path", &self.reaction_roles_path)
            .field("leave_debounce", &self.leave_debounce)
            .field("kick_window", &self.kick_window)
            .field("session_idle", &self.session_idle)
            .finish()
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_or(name: &'static str, default: u64, hint: &'static str) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid(name, hint)),
        Err(_) => Ok(default),
    }
}

/// Mapping from reactions on one message to roles.
///
/// Read from disk on every reaction event so edits apply without a restart.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReactionRoles {
    /// Message whose reactions grant roles
    pub message: String,
    /// Emoji name to role
    #[serde(default)]
    pub reactions: HashMap<String, ReactionRole>,
}

/// One reaction-role entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReactionRole {
    /// Human-readable role name
    pub name: String,
    /// Role id
    pub role: String,
}

impl ReactionRoles {
    /// Read the mapping file.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ConfigError::ReactionRoles {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;
        serde_json::from_slice(&bytes).map_err(|e| ConfigError::ReactionRoles {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    }

    /// Role granted by `emoji` on `message_id`, if any.
    pub fn role_for(&self, message_id: &str, emoji: &str) -> Option<&ReactionRole> {
        if self.message != message_id {
            return None;
        }
        self.reactions.get(emoji)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),

    /// The reaction-role file could not be read or parsed.
    #[error("failed to load reaction roles from {}: {details}", .path.display())]
    ReactionRoles {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        details: String,
    },
}
