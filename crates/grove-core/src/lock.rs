// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Keyed mutual exclusion.
//!
//! [`KeyedLock`] hands out one exclusive guard per string key. Critical sections
//! on the same key run one at a time in FIFO order, including across `.await`
//! points inside them; critical sections on different keys never wait on each
//! other. The guard releases the key when dropped, so the key is freed on every
//! exit path: normal return, `?`, panic, or cancellation of the holder.
//!
//! Locks are not reentrant. Acquiring a key that the current task already holds
//! deadlocks that key.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Lock keys used by the bot.
pub mod keys {
    /// Bug-report thread ids.
    pub const BUG_REPORTS: &str = "bugReports";
    /// Members inside membership screening.
    pub const PENDING_MEMBERS: &str = "pendingMembers";
    /// Per-member leave records.
    pub const LEAVE_STATES: &str = "leaveStates";
    /// Paginated suggestion sessions.
    pub const ACTIVE_USER_INTERACTIONS: &str = "activeUserInteractions";
}

type Slots = Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>;

fn slots_of(slots: &Slots) -> MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
    // The slot map is only touched in short non-panicking sections.
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-key async mutex.
///
/// Cloning is cheap and yields a handle to the same set of keys.
#[derive(Clone, Default)]
pub struct KeyedLock {
    slots: Slots,
}

impl std::fmt::Debug for KeyedLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedLock")
            .field("active_keys", &self.active_keys())
            .finish()
    }
}

impl KeyedLock {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    ///
    /// Waiters on the same key are served in arrival order.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let slot = {
            let mut slots = slots_of(&self.slots);
            Arc::clone(slots.entry(key.to_string()).or_default())
        };

        trace!(key = %key, "Waiting for lock key");
        let guard = slot.lock_owned().await;
        trace!(key = %key, "Acquired lock key");

        KeyGuard {
            key: key.to_string(),
            guard: Some(guard),
            slots: Arc::clone(&self.slots),
        }
    }

    /// Run `critical_section` while holding `key`.
    ///
    /// The critical section's output, including any `Err`, is returned as-is
    /// once the key has been released.
    pub async fn acquire<T, F, Fut>(&self, key: &str, critical_section: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.lock(key).await;
        critical_section().await
    }

    /// Whether some task currently holds `key`.
    pub fn is_locked(&self, key: &str) -> bool {
        slots_of(&self.slots)
            .get(key)
            .is_some_and(|slot| slot.try_lock().is_err())
    }

    /// Number of keys that are held or have waiters.
    pub fn active_keys(&self) -> usize {
        slots_of(&self.slots).len()
    }
}

/// Exclusive access to one key of a [`KeyedLock`]. Releases on drop.
pub struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    slots: Slots,
}

impl KeyGuard {
    /// The key this guard holds.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for KeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGuard").field("key", &self.key).finish()
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Waiters hold their own clone of the slot, so a count of one means
        // nobody is queued and the entry can go.
        let mut slots = slots_of(&self.slots);
        if let Some(slot) = slots.get(&self.key)
            && Arc::strong_count(slot) == 1
        {
            slots.remove(&self.key);
        }
        trace!(key = %self.key, "Released lock key");
    }
}
