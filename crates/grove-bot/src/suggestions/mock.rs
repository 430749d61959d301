// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory suggestion service for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::client::SuggestionService;
use super::{ApprovalState, NewSuggestion, Result, Suggestion, SuggestionError};

/// Suggestion service backed by a map, with switchable failures.
pub struct MockSuggestions {
    suggestions: Mutex<BTreeMap<u64, Suggestion>>,
    added: Mutex<Vec<NewSuggestion>>,
    next_id: AtomicU64,
    failure: Mutex<Option<u16>>,
}

impl Default for MockSuggestions {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSuggestions {
    /// Create an empty service. Ids are handed out from 1.
    pub fn new() -> Self {
        Self {
            suggestions: Mutex::new(BTreeMap::new()),
            added: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            failure: Mutex::new(None),
        }
    }

    fn suggestions(&self) -> MutexGuard<'_, BTreeMap<u64, Suggestion>> {
        self.suggestions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failure(&self) -> Result<()> {
        match *self.failure.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(status) => Err(SuggestionError::Failed {
                status,
                reason: "Internal Server Error".to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Store a suggestion directly.
    pub fn insert(&self, suggestion: Suggestion) {
        self.next_id.fetch_max(suggestion.id + 1, Ordering::SeqCst);
        self.suggestions().insert(suggestion.id, suggestion);
    }

    /// Make every call fail with `status` (`None` restores normal behaviour).
    pub fn fail_with(&self, status: Option<u16>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Bodies of all successful `add` calls.
    pub fn added(&self) -> Vec<NewSuggestion> {
        self.added
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current copy of a suggestion.
    pub fn stored(&self, id: u64) -> Option<Suggestion> {
        self.suggestions().get(&id).cloned()
    }
}

#[async_trait]
impl SuggestionService for MockSuggestions {
    async fn add(&self, suggestion: &NewSuggestion) -> Result<u64> {
        self.check_failure()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.suggestions().insert(
            id,
            Suggestion {
                id,
                author_id: suggestion.creator_id.clone(),
                message_id: suggestion.thread_id.clone(),
                state: ApprovalState::Pending,
            },
        );
        self.added
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(suggestion.clone());
        Ok(id)
    }

    async fn update_state(&self, id: u64, state: ApprovalState) -> Result<Suggestion> {
        self.check_failure()?;
        let mut suggestions = self.suggestions();
        let suggestion = suggestions.get_mut(&id).ok_or(SuggestionError::NotFound)?;
        suggestion.state = state;
        Ok(suggestion.clone())
    }

    async fn delete(&self, id: u64) -> Result<()> {
        self.check_failure()?;
        self.suggestions()
            .remove(&id)
            .map(|_| ())
            .ok_or(SuggestionError::NotFound)
    }

    async fn get(&self, id: u64) -> Result<Suggestion> {
        self.check_failure()?;
        self.stored(id).ok_or(SuggestionError::NotFound)
    }

    async fn by_author(&self, user_id: &str) -> Result<Vec<Suggestion>> {
        self.check_failure()?;
        Ok(self
            .suggestions()
            .values()
            .filter(|s| s.author_id == user_id)
            .cloned()
            .collect())
    }

    async fn by_message(&self, message_id: &str) -> Result<Suggestion> {
        self.check_failure()?;
        self.suggestions()
            .values()
            .find(|s| s.message_id == message_id)
            .cloned()
            .ok_or(SuggestionError::NotFound)
    }
}
