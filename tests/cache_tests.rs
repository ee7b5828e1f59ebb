// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable cache: persistence across instances and fail-closed behavior.

use mshprep::models::trial::TrialTimerState;
use mshprep::store::{keys, DurableCache};

#[test]
fn test_roundtrip_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let timer = TrialTimerState::fresh(chrono::Utc::now());
    {
        let cache = DurableCache::new(dir.path());
        cache.save(keys::TRIAL_TIMER, &timer);
    }

    // A fresh instance over the same directory sees the entry
    let reopened = DurableCache::new(dir.path());
    let loaded: TrialTimerState = reopened.load(keys::TRIAL_TIMER).unwrap();
    assert_eq!(loaded.elapsed_seconds, timer.elapsed_seconds);
    assert_eq!(loaded.is_running, timer.is_running);
}

#[test]
fn test_remove_deletes_entry() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DurableCache::new(dir.path());

    cache.save(keys::DEVICE_ID, &"fingerprint".to_string());
    cache.remove(keys::DEVICE_ID);

    assert!(cache.load::<String>(keys::DEVICE_ID).is_none());
    let reopened = DurableCache::new(dir.path());
    assert!(reopened.load::<String>(keys::DEVICE_ID).is_none());
}

#[test]
fn test_missing_key_is_none() {
    let cache = DurableCache::new_in_memory();
    assert!(cache.load::<String>("mshprep.v5.nothing").is_none());
}

#[test]
fn test_unusable_directory_degrades_to_memory() {
    // Pass a regular file where a directory is expected
    let file = tempfile::NamedTempFile::new().unwrap();
    let cache = DurableCache::new(file.path());

    assert!(!cache.is_persistent());

    // Still fully usable for the session
    cache.save(keys::DEVICE_ID, &"abc".to_string());
    assert_eq!(cache.load::<String>(keys::DEVICE_ID).unwrap(), "abc");
}

#[test]
fn test_corrupt_file_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(format!("{}.json", keys::TRIAL_TIMER)),
        b"{not json",
    )
    .unwrap();

    let cache = DurableCache::new(dir.path());
    assert!(cache.load::<TrialTimerState>(keys::TRIAL_TIMER).is_none());
}

#[test]
fn test_wrong_shape_loads_as_none() {
    let cache = DurableCache::new_in_memory();
    cache.save(keys::TRIAL_TIMER, &"just a string".to_string());

    assert!(cache.load::<TrialTimerState>(keys::TRIAL_TIMER).is_none());
}
