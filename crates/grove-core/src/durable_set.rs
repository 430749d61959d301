// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Durable identifier sets.
//!
//! A [`DurableSet`] is an in-memory set of string ids backed by one JSON file
//! holding the complete set as an array. The file is read once at startup and
//! rewritten in full by [`DurableSet::persist`]; after load only the in-memory
//! copy is read.
//!
//! [`SharedSet`] pairs a set with the lock key that governs it, so that every
//! mutation and its flush happen inside one critical section.

use std::collections::BTreeSet;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};
use crate::lock::KeyedLock;

/// In-memory id set with a full-rewrite JSON backing file.
///
/// The mutating methods take `&self` and are synchronous; callers must only use
/// them from inside the critical section of the key that owns the set.
#[derive(Debug)]
pub struct DurableSet {
    path: PathBuf,
    ids: Mutex<BTreeSet<String>>,
}

impl DurableSet {
    /// Read the backing file.
    ///
    /// A missing file yields an empty set. A file that is not a JSON array of
    /// strings (or `null`) is an error; corrupt state is never discarded silently.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let ids: BTreeSet<String> = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let parsed: Option<Vec<String>> = serde_json::from_slice(&bytes)
                    .map_err(|source| CoreError::CorruptStore {
                        path: path.clone(),
                        source,
                    })?;
                parsed.unwrap_or_default().into_iter().collect()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No backing file, starting empty");
                BTreeSet::new()
            }
            Err(source) => return Err(CoreError::StoreIo { path, source }),
        };

        info!(path = %path.display(), count = ids.len(), "Loaded durable set");

        Ok(Self {
            path,
            ids: Mutex::new(ids),
        })
    }

    /// Create an empty set that will persist to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ids: Mutex::new(BTreeSet::new()),
        }
    }

    fn ids(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `id` is in the set.
    pub fn has(&self, id: &str) -> bool {
        self.ids().contains(id)
    }

    /// Add `id`. Returns `false` if it was already present.
    pub fn add(&self, id: impl Into<String>) -> bool {
        self.ids().insert(id.into())
    }

    /// Remove `id`. Returns `false` if it was not present.
    pub fn remove(&self, id: &str) -> bool {
        self.ids().remove(id)
    }

    /// Number of ids.
    pub fn len(&self) -> usize {
        self.ids().len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }

    /// Sorted copy of the current ids.
    pub fn snapshot(&self) -> Vec<String> {
        self.ids().iter().cloned().collect()
    }

    /// Replace the backing file with the current in-memory set.
    ///
    /// The set is written to a sibling temporary file which is then renamed
    /// over the backing file, so a crash mid-write leaves the previous
    /// contents intact. Failures are returned to the caller; nothing is
    /// retried here.
    pub async fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.snapshot())?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|source| CoreError::StoreIo {
                path: staging.clone(),
                source,
            })?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|source| CoreError::StoreIo {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Persisted durable set");
        Ok(())
    }

    /// `<file>.tmp` next to the backing file.
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

/// A [`DurableSet`] bound to the lock key that serializes its mutations.
#[derive(Debug)]
pub struct SharedSet {
    key: &'static str,
    locks: KeyedLock,
    set: DurableSet,
}

impl SharedSet {
    /// Bind `set` to `key` on `locks`.
    pub fn new(key: &'static str, locks: KeyedLock, set: DurableSet) -> Self {
        Self { key, locks, set }
    }

    /// The lock key governing this set.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Run a critical section with exclusive access to the set.
    pub async fn with<'a, T, F, Fut>(&'a self, critical_section: F) -> T
    where
        F: FnOnce(&'a DurableSet) -> Fut,
        Fut: Future<Output = T> + 'a,
    {
        let _guard = self.locks.lock(self.key).await;
        critical_section(&self.set).await
    }

    /// Membership check under the key.
    pub async fn contains(&self, id: &str) -> bool {
        let _guard = self.locks.lock(self.key).await;
        self.set.has(id)
    }

    /// Add `id` and persist. Returns `Ok(false)` without writing if it was
    /// already present.
    ///
    /// A failed write rolls the in-memory add back, so memory and disk agree
    /// once the key is released.
    pub async fn insert(&self, id: &str) -> Result<bool> {
        let _guard = self.locks.lock(self.key).await;
        if !self.set.add(id) {
            return Ok(false);
        }
        if let Err(e) = self.set.persist().await {
            warn!(key = self.key, id = %id, error = %e, "Persist failed, rolling back add");
            self.set.remove(id);
            return Err(e);
        }
        Ok(true)
    }

    /// Remove `id` and persist. Returns `Ok(false)` without writing if it was
    /// not present. A failed write rolls the removal back.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let _guard = self.locks.lock(self.key).await;
        if !self.set.remove(id) {
            return Ok(false);
        }
        if let Err(e) = self.set.persist().await {
            warn!(key = self.key, id = %id, error = %e, "Persist failed, rolling back removal");
            self.set.add(id);
            return Err(e);
        }
        Ok(true)
    }

    /// Sorted copy of the ids, read under the key.
    pub async fn snapshot(&self) -> Vec<String> {
        let _guard = self.locks.lock(self.key).await;
        self.set.snapshot()
    }
}
