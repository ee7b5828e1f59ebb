// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth flow: session lifecycle around opaque login/logout calls.

mod common;

use chrono::Utc;
use common::{trial_user, TestEnv};
use mshprep::error::AppError;
use mshprep::models::trial::TrialTimerState;
use mshprep::services::AuthFlow;
use mshprep::store::keys;

fn auth(env: &TestEnv) -> AuthFlow {
    AuthFlow::new(
        env.api.clone(),
        env.session.clone(),
        env.clock.clone(),
        env.sync.clone(),
    )
}

#[tokio::test]
async fn test_unreachable_login_leaves_no_session() {
    let env = TestEnv::new();
    let flow = auth(&env);

    let err = flow.login("ada@example.com", "hunter22").await.unwrap_err();

    assert!(matches!(err, AppError::Backend(_)));
    assert!(env.session.snapshot().is_none());
}

#[tokio::test]
async fn test_invalid_email_rejected_locally() {
    let env = TestEnv::new();
    let flow = auth(&env);

    // Request validation runs before the (mock, failing) transport
    let err = flow.login("not-an-email", "hunter22").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_short_password_rejected_on_registration() {
    let env = TestEnv::new();
    let flow = auth(&env);

    let err = flow
        .register("Ada Obi", "ada@example.com", "short")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_logout_clears_session_but_keeps_trial_timer() {
    let env = TestEnv::new();
    env.session.set(trial_user());

    let mut timer = TrialTimerState::fresh(Utc::now());
    timer.elapsed_seconds = 1200;
    env.cache.save(keys::TRIAL_TIMER, &timer);

    auth(&env).logout().await;

    assert!(env.session.snapshot().is_none());
    assert!(
        env.cache
            .load::<mshprep::models::user::UserSession>(keys::USER_SNAPSHOT)
            .is_none(),
        "snapshot cache entry must be cleared"
    );

    // Logging out must not refund trial time
    let kept: TrialTimerState = env.cache.load(keys::TRIAL_TIMER).unwrap();
    assert_eq!(kept.elapsed_seconds, 1200);
}

#[tokio::test]
async fn test_session_store_restores_persisted_snapshot() {
    let env = TestEnv::new();
    env.session.set(trial_user());

    // A new store over the same cache sees the persisted snapshot
    let restored = mshprep::models::user::SessionStore::new(env.cache.clone());
    let user = restored.snapshot().unwrap();
    assert_eq!(user.email, "ada@example.com");
}
