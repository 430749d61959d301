// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Paginated interaction sessions.
//!
//! A session holds the items behind a multi-page reply, the pages rendered so
//! far and the page currently shown. Pages are rendered on first visit and then
//! cached. All access goes through the `activeUserInteractions` lock key.
//!
//! Sessions idle for longer than the configured timeout are evicted when new
//! sessions are created, and treated as missing when navigated.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::lock::{KeyedLock, keys};

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Previous page.
    Left,
    /// Next page.
    Right,
}

impl Direction {
    /// Target index for a move from `index` in a list of `len`, or `None` when
    /// the move would leave the list.
    pub fn step(self, index: usize, len: usize) -> Option<usize> {
        match self {
            Self::Left => index.checked_sub(1),
            Self::Right => index.checked_add(1).filter(|next| *next < len),
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(()),
        }
    }
}

/// The page shown after a create or navigate.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<P> {
    /// Rendered page.
    pub content: P,
    /// Position of the page.
    pub index: usize,
    /// Number of pages in the session.
    pub len: usize,
}

impl<P> Page<P> {
    /// Whether a previous page exists.
    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Whether a next page exists.
    pub fn has_next(&self) -> bool {
        self.index + 1 < self.len
    }
}

struct Session<I, P> {
    items: Vec<I>,
    pages: Vec<Option<P>>,
    index: usize,
    last_used: Instant,
}

/// Per-interaction pagination state.
pub struct SessionStore<I, P> {
    locks: KeyedLock,
    sessions: Mutex<HashMap<String, Session<I, P>>>,
    idle_timeout: Option<Duration>,
}

impl<I, P> SessionStore<I, P>
where
    I: Clone,
    P: Clone,
{
    /// Create a store. `idle_timeout = None` keeps sessions forever.
    pub fn new(locks: KeyedLock, idle_timeout: Option<Duration>) -> Self {
        Self {
            locks,
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Session<I, P>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_idle(&self, session: &Session<I, P>, now: Instant) -> bool {
        self.idle_timeout
            .is_some_and(|timeout| now.duration_since(session.last_used) > timeout)
    }

    /// Start a session at index 0 with its first page already rendered.
    pub async fn create(
        &self,
        interaction_id: impl Into<String>,
        items: Vec<I>,
        first_page: P,
    ) -> Result<Page<P>> {
        let interaction_id = interaction_id.into();
        let _guard = self.locks.lock(keys::ACTIVE_USER_INTERACTIONS).await;

        if items.is_empty() {
            return Err(CoreError::EmptySession(interaction_id));
        }

        let now = Instant::now();
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_idle(session, now));
        if sessions.len() < before {
            debug!(evicted = before - sessions.len(), "Evicted idle sessions");
        }

        let len = items.len();
        let mut pages = vec![None; len];
        pages[0] = Some(first_page.clone());
        sessions.insert(
            interaction_id.clone(),
            Session {
                items,
                pages,
                index: 0,
                last_used: now,
            },
        );
        debug!(interaction_id = %interaction_id, len, "Session created");

        Ok(Page {
            content: first_page,
            index: 0,
            len,
        })
    }

    /// Move one page in `direction`, rendering the target page on first visit.
    ///
    /// A move past either end leaves the index unchanged and returns the
    /// current page. If rendering fails the index is not moved.
    pub async fn navigate<F, Fut>(
        &self,
        interaction_id: &str,
        direction: Direction,
        render: F,
    ) -> Result<Page<P>>
    where
        F: FnOnce(I) -> Fut,
        Fut: Future<Output = Result<P>>,
    {
        let _guard = self.locks.lock(keys::ACTIVE_USER_INTERACTIONS).await;

        let (target, len, pending) = {
            let now = Instant::now();
            let mut sessions = self.sessions();
            let idle = match sessions.get(interaction_id) {
                Some(session) => self.is_idle(session, now),
                None => return Err(CoreError::SessionNotFound(interaction_id.to_string())),
            };
            if idle {
                sessions.remove(interaction_id);
                return Err(CoreError::SessionNotFound(interaction_id.to_string()));
            }
            let Some(session) = sessions.get_mut(interaction_id) else {
                return Err(CoreError::SessionNotFound(interaction_id.to_string()));
            };
            session.last_used = now;

            let len = session.items.len();
            let target = direction.step(session.index, len).unwrap_or(session.index);
            let pending = match &session.pages[target] {
                Some(page) => Ok(page.clone()),
                None => Err(session.items[target].clone()),
            };
            (target, len, pending)
        };

        let content = match pending {
            Ok(page) => page,
            Err(item) => render(item).await?,
        };

        let mut sessions = self.sessions();
        let session = sessions
            .get_mut(interaction_id)
            .ok_or_else(|| CoreError::SessionNotFound(interaction_id.to_string()))?;
        session.pages[target] = Some(content.clone());
        session.index = target;

        Ok(Page {
            content,
            index: target,
            len,
        })
    }

    /// Current index of a session.
    pub fn index_of(&self, interaction_id: &str) -> Option<usize> {
        self.sessions().get(interaction_id).map(|s| s.index)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    /// Drop a session.
    pub async fn remove(&self, interaction_id: &str) -> bool {
        let _guard = self.locks.lock(keys::ACTIVE_USER_INTERACTIONS).await;
        self.sessions().remove(interaction_id).is_some()
    }
}
