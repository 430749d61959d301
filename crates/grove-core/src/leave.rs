// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Leave-state tracking.
//!
//! When a member disappears the platform may deliver up to three independent
//! signals in any order: the member-removed event, a ban-added event, and an
//! audit-log kick entry that can only be polled. [`LeaveTracker`] folds them into
//! exactly one [`Departure`] per member:
//!
//! | Evidence at resolution | Outcome |
//! |------------------------|---------|
//! | ban present | [`LeaveOutcome::Banned`] |
//! | kick present, no ban | [`LeaveOutcome::Kicked`] |
//! | neither | [`LeaveOutcome::Left`] |
//!
//! A remove with no kick on record starts a debounce timer; a ban arriving in
//! that window cancels the timer and resolves straight away. Every transition,
//! including the timer firing, runs under the `leaveStates` lock key.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::lock::{KeyedLock, keys};

/// A guild member (or banned user) as seen by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    /// Platform user id.
    pub id: String,
    /// Account tag (`name` or `name#1234`).
    pub tag: String,
    /// Server nickname, when known.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl MemberRef {
    /// Create a member reference without a nickname.
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            display_name: None,
        }
    }

    /// Nickname if set, otherwise the tag.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.tag)
    }

    /// Platform mention markup.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// Why a kick or ban happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// Moderator supplied a reason.
    Given(String),
    /// The action happened without a reason.
    Unspecified,
}

impl Reason {
    /// Empty or missing reasons are unspecified.
    pub fn from_optional(reason: Option<String>) -> Self {
        match reason {
            Some(text) if !text.trim().is_empty() => Self::Given(text),
            _ => Self::Unspecified,
        }
    }

    /// The reason text, if one was given.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Given(text) => Some(text),
            Self::Unspecified => None,
        }
    }
}

/// What is known about one kind of evidence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Signal {
    /// Not looked up and not received yet.
    #[default]
    Unknown,
    /// Looked up and not found.
    Absent,
    /// Observed.
    Present(Reason),
}

/// Latest kick entry from the platform audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickEntry {
    /// Kicked user id.
    pub target_id: String,
    /// Reason recorded with the kick.
    pub reason: Option<String>,
    /// When the kick was logged.
    pub created_at: DateTime<Utc>,
}

impl KickEntry {
    /// Whether this entry explains `member_id` leaving at `now`.
    pub fn explains(&self, member_id: &str, now: DateTime<Utc>, window: Duration) -> bool {
        let age = now.signed_duration_since(self.created_at);
        self.target_id == member_id && age.to_std().ok().is_none_or(|age| age <= window)
    }
}

/// Final classification of a departure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The member was banned.
    Banned {
        /// Ban reason, if given.
        reason: Option<String>,
    },
    /// The member was kicked.
    Kicked {
        /// Kick reason, if given.
        reason: Option<String>,
    },
    /// The member left on their own.
    Left,
}

/// A resolved departure, handed to [`LeaveSignals::announce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// Who left.
    pub member: MemberRef,
    /// How.
    pub outcome: LeaveOutcome,
}

/// Collected evidence for a member that has not been resolved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveState {
    /// Most recent member information.
    pub member: MemberRef,
    /// Kick evidence.
    pub kick: Signal,
    /// Ban evidence.
    pub ban: Signal,
}

impl LeaveState {
    fn new(member: MemberRef) -> Self {
        Self {
            member,
            kick: Signal::Unknown,
            ban: Signal::Unknown,
        }
    }

    /// Outcome implied by the evidence so far, or `None` while it still
    /// depends on an unknown kick.
    pub fn settled_outcome(&self) -> Option<LeaveOutcome> {
        match (&self.ban, &self.kick) {
            (Signal::Present(reason), _) => Some(LeaveOutcome::Banned {
                reason: reason.text().map(str::to_string),
            }),
            (_, Signal::Present(reason)) => Some(LeaveOutcome::Kicked {
                reason: reason.text().map(str::to_string),
            }),
            (_, Signal::Absent) => Some(LeaveOutcome::Left),
            (_, Signal::Unknown) => None,
        }
    }
}

/// Platform operations the tracker needs.
#[async_trait]
pub trait LeaveSignals: Send + Sync {
    /// The most recent kick in the audit log, if any.
    async fn latest_kick(&self) -> Result<Option<KickEntry>>;

    /// Publish a resolved departure.
    async fn announce(&self, departure: &Departure) -> Result<()>;
}

/// Tracker timing.
#[derive(Debug, Clone)]
pub struct LeaveTrackerConfig {
    /// How long a bare remove waits for corroborating signals.
    pub debounce: Duration,
    /// Maximum age of an audit-log kick entry that still counts.
    pub kick_window: Duration,
}

impl Default for LeaveTrackerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1500),
            kick_window: Duration::from_secs(3),
        }
    }
}

struct PendingTimer {
    epoch: u64,
    handle: AbortHandle,
}

struct Record {
    state: LeaveState,
    timer: Option<PendingTimer>,
}

/// Reconciles remove, ban and kick signals into one announcement per member.
pub struct LeaveTracker {
    locks: KeyedLock,
    records: Mutex<HashMap<String, Record>>,
    signals: Arc<dyn LeaveSignals>,
    config: LeaveTrackerConfig,
    epochs: AtomicU64,
}

impl LeaveTracker {
    /// Create a tracker sharing `locks` with the rest of the bot.
    pub fn new(
        locks: KeyedLock,
        signals: Arc<dyn LeaveSignals>,
        config: LeaveTrackerConfig,
    ) -> Self {
        Self {
            locks,
            records: Mutex::new(HashMap::new()),
            signals,
            config,
            epochs: AtomicU64::new(0),
        }
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evidence currently held for `member_id`.
    pub fn state(&self, member_id: &str) -> Option<LeaveState> {
        self.records().get(member_id).map(|r| r.state.clone())
    }

    /// Whether a debounce timer is pending for `member_id`.
    pub fn is_debouncing(&self, member_id: &str) -> bool {
        self.records()
            .get(member_id)
            .is_some_and(|r| r.timer.is_some())
    }

    /// Number of unresolved members.
    pub fn pending(&self) -> usize {
        self.records().len()
    }

    /// Handle a member-removed event.
    ///
    /// Returns the outcome when the departure resolved immediately, `None`
    /// when resolution was deferred to the debounce timer.
    #[instrument(skip(self, member), fields(member_id = %member.id))]
    pub async fn member_removed(
        self: &Arc<Self>,
        member: MemberRef,
    ) -> Result<Option<LeaveOutcome>> {
        let _guard = self.locks.lock(keys::LEAVE_STATES).await;

        let existing = {
            let mut records = self.records();
            match records.get_mut(&member.id) {
                Some(record) => {
                    // Remove carries the nickname; a ban only knows the user.
                    record.state.member = member.clone();
                    true
                }
                None => false,
            }
        };
        if existing {
            debug!("Record already present, resolving");
            return self.resolve_locked(&member.id).await;
        }

        let mut state = LeaveState::new(member.clone());
        if let Some(reason) = self.lookup_kick(&member.id).await? {
            state.kick = Signal::Present(reason);
            self.records().insert(member.id.clone(), Record { state, timer: None });
            return self.resolve_locked(&member.id).await;
        }

        let epoch = self.epochs.fetch_add(1, Ordering::Relaxed);
        let handle = self.schedule_resolution(member.id.clone(), epoch);
        self.records().insert(
            member.id.clone(),
            Record {
                state,
                timer: Some(PendingTimer { epoch, handle }),
            },
        );
        debug!(debounce_ms = self.config.debounce.as_millis() as u64, "Departure pending");
        Ok(None)
    }

    /// Handle a ban-added event.
    ///
    /// With an existing record the ban wins immediately and any debounce timer
    /// is cancelled. Without one the ban is stored until a remove arrives.
    #[instrument(skip(self, user, reason), fields(member_id = %user.id))]
    pub async fn ban_added(
        self: &Arc<Self>,
        user: MemberRef,
        reason: Reason,
    ) -> Result<Option<LeaveOutcome>> {
        let _guard = self.locks.lock(keys::LEAVE_STATES).await;

        let existing = {
            let mut records = self.records();
            match records.get_mut(&user.id) {
                Some(record) => {
                    record.state.ban = Signal::Present(reason.clone());
                    if let Some(timer) = record.timer.take() {
                        timer.handle.abort();
                        debug!(epoch = timer.epoch, "Cancelled debounce timer");
                    }
                    true
                }
                None => false,
            }
        };
        if existing {
            return self.resolve_locked(&user.id).await;
        }

        let mut state = LeaveState::new(user.clone());
        state.ban = Signal::Present(reason);
        self.records().insert(user.id, Record { state, timer: None });
        debug!("Ban recorded, waiting for remove");
        Ok(None)
    }

    fn schedule_resolution(self: &Arc<Self>, member_id: String, epoch: u64) -> AbortHandle {
        let tracker = Arc::clone(self);
        let delay = self.config.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = tracker.debounce_expired(&member_id, epoch).await {
                warn!(member_id = %member_id, error = %e, "Failed to resolve departure");
            }
        })
        .abort_handle()
    }

    async fn debounce_expired(&self, member_id: &str, epoch: u64) -> Result<Option<LeaveOutcome>> {
        let _guard = self.locks.lock(keys::LEAVE_STATES).await;

        let current = {
            let mut records = self.records();
            match records.get_mut(member_id) {
                // Detach ourselves first so resolution does not abort this task.
                Some(record) if record.timer.as_ref().is_some_and(|t| t.epoch == epoch) => {
                    record.timer = None;
                    true
                }
                _ => false,
            }
        };
        if !current {
            debug!(member_id = %member_id, epoch, "Stale debounce timer");
            return Ok(None);
        }

        self.resolve_locked(member_id).await
    }

    /// Remove the record and announce it. Caller holds `leaveStates`.
    async fn resolve_locked(&self, member_id: &str) -> Result<Option<LeaveOutcome>> {
        let Some(record) = self.records().remove(member_id) else {
            return Ok(None);
        };
        if let Some(timer) = record.timer {
            timer.handle.abort();
        }

        let state = record.state;
        let outcome = match state.settled_outcome() {
            Some(outcome) => outcome,
            None => match self.lookup_kick(member_id).await? {
                Some(reason) => LeaveOutcome::Kicked {
                    reason: reason.text().map(str::to_string),
                },
                None => LeaveOutcome::Left,
            },
        };

        info!(member_id = %member_id, outcome = ?outcome, "Departure resolved");

        let departure = Departure {
            member: state.member,
            outcome: outcome.clone(),
        };
        self.signals.announce(&departure).await?;
        Ok(Some(outcome))
    }

    async fn lookup_kick(&self, member_id: &str) -> Result<Option<Reason>> {
        let entry = self.signals.latest_kick().await?;
        let now = Utc::now();
        Ok(entry
            .filter(|kick| kick.explains(member_id, now, self.config.kick_window))
            .map(|kick| Reason::from_optional(kick.reason)))
    }
}
