// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use mshprep::models::user::{SessionStore, UserSession, UserStatus};
use mshprep::services::{AccessGate, Connectivity, ExamApi, SyncAgent, TrialClock};
use mshprep::store::DurableCache;

/// Full component stack over an in-memory cache and an offline backend.
#[allow(dead_code)]
pub struct TestEnv {
    pub cache: DurableCache,
    pub api: ExamApi,
    pub session: SessionStore,
    pub gate: AccessGate,
    pub clock: TrialClock,
    pub connectivity: Connectivity,
    pub sync: SyncAgent,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new() -> Self {
        let cache = DurableCache::new_in_memory();
        let api = ExamApi::new_mock();
        let session = SessionStore::new(cache.clone());
        let gate = AccessGate::new(cache.clone(), session.clone());
        let clock = TrialClock::new(cache.clone(), api.clone(), gate.clone(), 30);
        let connectivity = Connectivity::new_online();
        let sync = SyncAgent::new(
            cache.clone(),
            api.clone(),
            connectivity.clone(),
            clock.clone(),
            1,
        );

        Self {
            cache,
            api,
            session,
            gate,
            clock,
            connectivity,
            sync,
        }
    }
}

/// A user partway through their trial.
#[allow(dead_code)]
pub fn trial_user() -> UserSession {
    UserSession::new(
        "Ada Obi".to_string(),
        "ada@example.com".to_string(),
        UserStatus::Trial,
        false,
    )
}

/// A fully activated user.
#[allow(dead_code)]
pub fn activated_user() -> UserSession {
    UserSession::new(
        "Chinedu Eze".to_string(),
        "chinedu@example.com".to_string(),
        UserStatus::Activated,
        false,
    )
}

/// The standard JAMB subject selection used across tests.
#[allow(dead_code)]
pub fn jamb_subjects() -> Vec<String> {
    ["english", "mathematics", "physics", "chemistry"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// The standard WAEC subject selection used across tests.
#[allow(dead_code)]
pub fn waec_subjects() -> Vec<String> {
    [
        "english",
        "mathematics",
        "physics",
        "chemistry",
        "biology",
        "economics",
        "government",
        "literature",
        "geography",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
