// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tests for DurableSet loading/persistence and SharedSet critical sections.

use std::sync::Arc;

use grove_core::durable_set::{DurableSet, SharedSet};
use grove_core::error::CoreError;
use grove_core::lock::{KeyedLock, keys};
use tempfile::TempDir;

// ============================================================================
// Load
// ============================================================================

#[tokio::test]
async fn test_missing_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let set = DurableSet::load(dir.path().join("bug-reports.json"))
        .await
        .unwrap();
    assert!(set.is_empty());
}

#[tokio::test]
async fn test_null_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bug-reports.json");
    std::fs::write(&path, "null").unwrap();

    let set = DurableSet::load(&path).await.unwrap();
    assert!(set.is_empty());
}

#[tokio::test]
async fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bug-reports.json");
    std::fs::write(&path, r#"{"not": "an array"}"#).unwrap();

    let err = DurableSet::load(&path).await.unwrap_err();
    assert!(matches!(err, CoreError::CorruptStore { .. }));
}

#[tokio::test]
async fn test_reads_existing_array() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bug-reports.json");
    std::fs::write(&path, r#"["111","222","111"]"#).unwrap();

    let set = DurableSet::load(&path).await.unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.has("111"));
    assert!(set.has("222"));
    assert!(!set.has("333"));
}

// ============================================================================
// Persist round trip
// ============================================================================

#[tokio::test]
async fn test_persist_then_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pending-members.json");

    let set = DurableSet::empty(&path);
    set.add("42");
    set.add("7");
    set.add("1001");
    set.persist().await.unwrap();

    let reloaded = DurableSet::load(&path).await.unwrap();
    assert_eq!(reloaded.snapshot(), set.snapshot());

    let raw: Vec<String> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(raw.len(), 3);
}

#[tokio::test]
async fn test_empty_set_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pending-members.json");

    DurableSet::empty(&path).persist().await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    assert!(DurableSet::load(&path).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persist_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no-such-dir").join("bug-reports.json");

    let set = DurableSet::empty(&path);
    set.add("1");
    let err = set.persist().await.unwrap_err();
    assert!(matches!(err, CoreError::StoreIo { .. }));
}

#[tokio::test]
async fn test_persist_replaces_file_without_leftovers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bug-reports.json");
    std::fs::write(&path, r#"["old"]"#).unwrap();

    let set = DurableSet::load(&path).await.unwrap();
    set.add("new");
    set.persist().await.unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"["new","old"]"#);
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("bug-reports.json")]);
}

#[tokio::test]
async fn test_failed_persist_keeps_previous_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bug-reports.json");
    std::fs::write(&path, r#"["1"]"#).unwrap();
    // A directory where the staging file belongs makes the write fail.
    std::fs::create_dir(dir.path().join("bug-reports.json.tmp")).unwrap();

    let set = DurableSet::load(&path).await.unwrap();
    set.add("2");
    let err = set.persist().await.unwrap_err();

    assert!(matches!(err, CoreError::StoreIo { .. }));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"["1"]"#);
}

// ============================================================================
// SharedSet
// ============================================================================

#[tokio::test]
async fn test_insert_and_remove_report_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bug-reports.json");
    let shared = SharedSet::new(keys::BUG_REPORTS, KeyedLock::new(), DurableSet::empty(&path));

    assert!(shared.insert("10").await.unwrap());
    assert!(!shared.insert("10").await.unwrap());
    assert!(shared.contains("10").await);

    assert!(shared.remove("10").await.unwrap());
    assert!(!shared.remove("10").await.unwrap());
    assert!(DurableSet::load(&path).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_write_rolls_back_memory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("bug-reports.json");
    let shared = SharedSet::new(keys::BUG_REPORTS, KeyedLock::new(), DurableSet::empty(&path));

    assert!(shared.insert("10").await.is_err());
    assert!(!shared.contains("10").await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_inserts_lose_no_update() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bug-reports.json");
    let locks = KeyedLock::new();
    let shared = Arc::new(SharedSet::new(
        keys::BUG_REPORTS,
        locks.clone(),
        DurableSet::empty(&path),
    ));

    let ids: Vec<String> = (0..32).map(|i| format!("thread-{i}")).collect();
    let tasks = ids.iter().cloned().map(|id| {
        let shared = shared.clone();
        tokio::spawn(async move { shared.insert(&id).await })
    });
    for result in futures::future::join_all(tasks).await {
        assert!(result.unwrap().unwrap());
    }

    let reloaded = DurableSet::load(&path).await.unwrap();
    assert_eq!(reloaded.len(), ids.len());
    for id in &ids {
        assert!(reloaded.has(id));
    }
    assert_eq!(locks.active_keys(), 0);
}

#[tokio::test]
async fn test_with_gives_exclusive_access() {
    let dir = TempDir::new().unwrap();
    let shared = SharedSet::new(
        keys::PENDING_MEMBERS,
        KeyedLock::new(),
        DurableSet::empty(dir.path().join("pending-members.json")),
    );

    let added = shared
        .with(|set| async move {
            let fresh = set.add("5");
            set.persist().await.map(|_| fresh)
        })
        .await
        .unwrap();
    assert!(added);
    assert_eq!(shared.snapshot().await, vec!["5".to_string()]);
}
