// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Grove Bot - Community Moderation for the Witch's Grove
//!
//! Watches a guild for membership changes, forum posts, reactions and slash
//! commands, and answers them through the platform REST API. Shared state
//! lives in `grove-core`; this crate holds the platform and service clients,
//! the event model and the handlers.
//!
//! # Architecture
//!
//! ```text
//!   gateway bridge process
//!          │  JSON lines (BotEvent)
//!          ▼
//! ┌──────────────────┐      ┌────────────────────────────────────────────┐
//! │   EventBridge    │─────▶│ Bot::dispatch (one task per event)         │
//! └──────────────────┘      └────────────────────────────────────────────┘
//!                              │          │             │            │
//!                              ▼          ▼             ▼            ▼
//!                         membership  bug_reports  suggestions   reactions
//!                              │          │             │            │
//!               ┌──────────────┴──────────┴─────┬───────┴────────────┘
//!               ▼                               ▼
//!   ┌──────────────────────┐        ┌──────────────────────┐
//!   │ ChatPlatform         │        │ SuggestionService    │
//!   │ (DiscordRest / Mock) │        │ (Http / Mock)        │
//!   └──────────────────────┘        └──────────────────────┘
//! ```
//!
//! # Features
//!
//! | Feature | Trigger | State |
//! |---------|---------|-------|
//! | Screening log and welcome | member join, system join notice | `pendingMembers` |
//! | Departure announcements | member remove, ban, audit-log kick | `leaveStates` |
//! | Bug-report tracking | bug forum post, `/editbugs` | `bugReports` |
//! | Suggestions | suggestion forum post, `/editsuggestions`, `/getsuggestions` | `activeUserInteractions` |
//! | Reaction roles | reaction add/remove | mapping file |
//!
//! # Modules
//!
//! - [`config`]: environment configuration and the reaction-role file
//! - [`events`]: incoming event model
//! - [`platform`]: chat platform trait, REST client and mock
//! - [`suggestions`]: suggestion service trait, HTTP client, mock and embeds
//! - [`handlers`]: one module per feature
//! - [`bot`]: shared handle and dispatch
//! - [`bridge`]: newline-delimited event ingestion

#![deny(missing_docs)]

/// Shared bot handle and event dispatch.
pub mod bot;

/// Newline-delimited event ingestion.
pub mod bridge;

/// Configuration from environment variables.
pub mod config;

/// Error types for the bot.
pub mod error;

/// Incoming platform events.
pub mod events;

/// Event handlers, one module per feature.
pub mod handlers;

/// Chat platform abstraction.
pub mod platform;

/// Suggestion service model, clients and rendering.
pub mod suggestions;

pub use bot::Bot;
pub use bridge::{BridgeStats, EventBridge};
pub use config::Config;
pub use error::{Error, Result};
pub use events::BotEvent;
