// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for grove-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the coordination layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// Reading or writing a store's backing file failed.
    #[error("Store I/O error on '{}': {source}", .path.display())]
    StoreIo {
        /// Backing file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A store's backing file does not contain a JSON array of strings.
    #[error("Store file '{}' is corrupt: {source}", .path.display())]
    CorruptStore {
        /// Backing file path.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a store snapshot failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No paginated session exists for the interaction (never created or evicted).
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    /// A paginated session needs at least one item.
    #[error("Session '{0}' has no items")]
    EmptySession(String),

    /// A collaborator (platform, renderer) failed inside a critical section.
    #[error("{operation} failed: {details}")]
    Collaborator {
        /// The operation that failed.
        operation: &'static str,
        /// Error details.
        details: String,
    },
}

impl CoreError {
    /// Build a collaborator error from anything displayable.
    pub fn collaborator(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Collaborator {
            operation,
            details: err.to_string(),
        }
    }
}
