// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync agent: idempotent buffering, offline no-ops, and retry retention.

mod common;

use common::TestEnv;
use mshprep::models::sync::{SyncBuffer, SyncCategory};
use mshprep::store::keys;
use serde_json::json;

#[tokio::test]
async fn test_double_buffer_coalesces_to_latest_payload() {
    let env = TestEnv::new();

    env.sync
        .buffer_change(SyncCategory::TrialTimer, json!({"elapsed_seconds": 100}));
    env.sync
        .buffer_change(SyncCategory::TrialTimer, json!({"elapsed_seconds": 160}));

    let buffer: SyncBuffer = env.cache.load(keys::SYNC_BUFFER).unwrap();
    let unsynced = buffer.unsynced();

    assert_eq!(unsynced.len(), 1, "same category must coalesce");
    assert_eq!(unsynced[0].1.payload["elapsed_seconds"], 160);
}

#[tokio::test]
async fn test_distinct_categories_are_kept_separate() {
    let env = TestEnv::new();

    env.sync
        .buffer_change(SyncCategory::TrialTimer, json!({"elapsed_seconds": 5}));
    env.sync
        .buffer_change(SyncCategory::ExamResults, json!({"score": 31}));

    let buffer: SyncBuffer = env.cache.load(keys::SYNC_BUFFER).unwrap();
    assert_eq!(buffer.unsynced_count(), 2);
}

#[tokio::test]
async fn test_flush_while_offline_is_a_clean_noop() {
    let env = TestEnv::new();
    env.connectivity.set_online(false);

    env.sync
        .buffer_change(SyncCategory::RecentActivity, json!({"entries": []}));

    env.sync.flush().await.expect("offline flush must not error");

    let buffer: SyncBuffer = env.cache.load(keys::SYNC_BUFFER).unwrap();
    assert_eq!(
        buffer.unsynced_count(),
        1,
        "entries must stay staged for the next trigger"
    );
}

#[tokio::test]
async fn test_failed_flush_retains_entries() {
    let env = TestEnv::new();

    env.sync
        .buffer_change(SyncCategory::UserProfile, json!({"display_name": "Ada"}));

    // Online, but the mock backend fails the request
    let result = env.sync.flush().await;
    assert!(result.is_err());

    let buffer: SyncBuffer = env.cache.load(keys::SYNC_BUFFER).unwrap();
    assert_eq!(buffer.unsynced_count(), 1, "never drop before an ack");
}

#[tokio::test]
async fn test_pull_while_offline_is_a_clean_noop() {
    let env = TestEnv::new();
    env.connectivity.set_online(false);

    env.sync.pull().await.expect("offline pull must not error");
}

#[tokio::test]
async fn test_reconnect_flips_connectivity_and_retries() {
    let env = TestEnv::new();
    env.connectivity.set_online(false);
    env.sync
        .buffer_change(SyncCategory::TrialTimer, json!({"elapsed_seconds": 42}));

    env.sync.on_online().await;

    assert!(env.connectivity.is_online());
    // The retry ran against the unreachable mock backend, so the entry is
    // still staged, not dropped
    let buffer: SyncBuffer = env.cache.load(keys::SYNC_BUFFER).unwrap();
    assert_eq!(buffer.unsynced_count(), 1);
}
