// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the bot.

use thiserror::Error;

use crate::config::ConfigError;
use crate::platform::PlatformError;
use crate::suggestions::SuggestionError;

/// Errors surfaced by event handlers and startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Shared-state failure (persistence, sessions, leave tracking).
    #[error(transparent)]
    Core(#[from] grove_core::CoreError),

    /// Chat platform call failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Suggestion service call failed.
    #[error(transparent)]
    Suggestions(#[from] SuggestionError),

    /// Invalid or unreadable configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An incoming event line could not be decoded.
    #[error("Malformed event: {0}")]
    MalformedEvent(#[from] serde_json::Error),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, Error>;
