// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared helpers for grove-core integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use grove_core::error::{CoreError, Result};
use grove_core::leave::{Departure, KickEntry, LeaveSignals, MemberRef};

/// Records announcements and serves a configurable audit-log kick.
#[derive(Default)]
pub struct MockSignals {
    kick: Mutex<Option<KickEntry>>,
    announced: Mutex<Vec<Departure>>,
    pub fail_lookups: bool,
}

impl MockSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_lookups() -> Self {
        Self {
            fail_lookups: true,
            ..Self::default()
        }
    }

    /// Make the audit log report a fresh kick of `member_id`.
    pub fn set_kick(&self, member_id: &str, reason: Option<&str>) {
        *self.kick.lock().unwrap() = Some(KickEntry {
            target_id: member_id.to_string(),
            reason: reason.map(str::to_string),
            created_at: Utc::now(),
        });
    }

    pub fn announced(&self) -> Vec<Departure> {
        self.announced.lock().unwrap().clone()
    }
}

#[async_trait]
impl LeaveSignals for MockSignals {
    async fn latest_kick(&self) -> Result<Option<KickEntry>> {
        if self.fail_lookups {
            return Err(CoreError::collaborator("fetch audit log", "HTTP 503"));
        }
        Ok(self.kick.lock().unwrap().clone())
    }

    async fn announce(&self, departure: &Departure) -> Result<()> {
        self.announced.lock().unwrap().push(departure.clone());
        Ok(())
    }
}

pub fn member(id: &str) -> MemberRef {
    MemberRef {
        id: id.to_string(),
        tag: format!("user{id}"),
        display_name: Some(format!("Nick{id}")),
    }
}
