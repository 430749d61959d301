// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Grove Core - State Coordination for the Grove Bot
//!
//! Event handlers in the bot run concurrently and suspend on I/O (platform
//! calls, file writes, remote lookups). This crate owns every piece of shared
//! state they touch and serializes access to it by lock key.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  grove-bot handlers (events, commands)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//!        │                 │                    │                    │
//!        ▼                 ▼                    ▼                    ▼
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │ SharedSet   │   │ SharedSet   │   │  LeaveTracker    │   │ SessionStore │
//! │ bugReports  │   │ pendingMemb │   │  leaveStates     │   │ activeUser.. │
//! └─────────────┘   └─────────────┘   └──────────────────┘   └──────────────┘
//!        │                 │                    │                    │
//!        └─────────────────┴─────────┬──────────┴────────────────────┘
//!                                    ▼
//!                          ┌───────────────────┐
//!                          │    KeyedLock      │
//!                          │ (one FIFO / key)  │
//!                          └───────────────────┘
//! ```
//!
//! # Lock Keys
//!
//! | Key | Guards |
//! |-----|--------|
//! | `bugReports` | bug-report thread ids and `bug-reports.json` |
//! | `pendingMembers` | members inside membership screening and `pending-members.json` |
//! | `leaveStates` | per-member leave records and their debounce timers |
//! | `activeUserInteractions` | paginated suggestion sessions |
//!
//! # Leave State Machine
//!
//! ```text
//!   (no record) ──remove, no kick──▶ PENDING(timer) ──1.5s──▶ RESOLVED
//!        │                               │
//!        │ ban                           │ ban (cancel timer)
//!        ▼                               ▼
//!   PENDING(ban) ──────remove──────▶ RESOLVED ◀──remove, fresh kick── (no record)
//! ```
//!
//! # Modules
//!
//! - [`lock`]: keyed mutual exclusion with scoped guards
//! - [`durable_set`]: JSON-file backed identifier sets
//! - [`leave`]: member departure reconciliation
//! - [`session`]: paginated interaction sessions
//! - [`error`]: error types

#![deny(missing_docs)]

/// Durable identifier sets persisted as JSON arrays.
pub mod durable_set;

/// Error types for coordination operations.
pub mod error;

/// Leave-state tracking for departing members.
pub mod leave;

/// Keyed mutual exclusion.
pub mod lock;

/// Paginated interaction sessions.
pub mod session;

pub use durable_set::{DurableSet, SharedSet};
pub use error::{CoreError, Result};
pub use leave::{LeaveTracker, LeaveTrackerConfig};
pub use lock::{KeyGuard, KeyedLock};
pub use session::{Direction, Page, SessionStore};
