// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trial clock behavior: monotonicity, gap compensation, and the
//! edge-triggered expiry guarantee.

mod common;

use chrono::{DateTime, Duration, Utc};
use common::{trial_user, TestEnv};
use mshprep::models::trial::TrialTimerState;
use mshprep::models::user::UserStatus;
use mshprep::services::{ClockEvent, StartOutcome};
use mshprep::store::keys;
use tokio::sync::broadcast::error::TryRecvError;

fn t0() -> DateTime<Utc> {
    "2026-03-01T08:00:00Z".parse().unwrap()
}

#[test]
fn test_elapsed_is_monotonic_across_mixed_transitions() {
    let mut state = TrialTimerState::fresh(t0());
    let mut previous = 0u64;
    let mut now = t0();

    // Interleave ticks, pauses, and resumes (including a backwards clock)
    // and assert elapsed never decreases.
    for step in 0..200u64 {
        now = now + Duration::seconds(1);
        match step % 7 {
            0 | 1 | 2 | 3 => {
                state.apply_tick(now);
            }
            4 => state.apply_pause(now),
            5 => {
                state.resume_from(now + Duration::seconds(30));
            }
            _ => {
                state.resume_from(now - Duration::seconds(600));
            }
        }
        assert!(
            state.elapsed_seconds >= previous,
            "elapsed decreased at step {}: {} -> {}",
            step,
            previous,
            state.elapsed_seconds
        );
        previous = state.elapsed_seconds;
    }
}

#[test]
fn test_gap_resume_from_3550_to_3700_expires_once() {
    let mut state = TrialTimerState::fresh(t0());
    state.elapsed_seconds = 3550;
    state.apply_pause(t0());

    let crossing = state.resume_from(t0() + Duration::seconds(150));

    assert!(crossing.expired_now);
    assert_eq!(crossing.elapsed_seconds, 3700);

    // No later transition re-fires or moves elapsed
    assert!(!state.apply_tick(t0() + Duration::seconds(151)).expired_now);
    assert!(!state.resume_from(t0() + Duration::seconds(300)).expired_now);
    assert_eq!(state.elapsed_seconds, 3700);
}

#[tokio::test]
async fn test_hidden_tab_near_limit_expires_immediately_on_resume() {
    let env = TestEnv::new();
    env.session.set(trial_user());

    // 3595 elapsed, tab hidden 20 real seconds ago
    let paused_at = Utc::now() - Duration::seconds(20);
    let mut timer = TrialTimerState::fresh(paused_at - Duration::seconds(3595));
    timer.elapsed_seconds = 3595;
    timer.apply_pause(paused_at);
    env.cache.save(keys::TRIAL_TIMER, &timer);

    let mut events = env.clock.subscribe();
    let outcome = env.clock.start();

    assert_eq!(outcome, StartOutcome::Expired);

    // Expiry signaled exactly once
    assert_eq!(events.try_recv().unwrap(), ClockEvent::Expired);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    // Gap pushed elapsed past the allotment and was persisted
    let persisted: TrialTimerState = env.cache.load(keys::TRIAL_TIMER).unwrap();
    assert!(persisted.elapsed_seconds >= 3600);
    assert!(persisted.has_expired);

    // Access revoked on the live session
    let user = env.session.snapshot().unwrap();
    assert_eq!(user.status, UserStatus::Expired);
    assert!(!user.has_access);
}

#[tokio::test]
async fn test_start_refuses_when_marker_set_even_with_fresh_timer() {
    let env = TestEnv::new();
    env.session.set(trial_user());
    env.gate.mark_trial_consumed();

    // Simulate a wiped/fresh timer record
    env.cache.remove(keys::TRIAL_TIMER);

    let mut events = env.clock.subscribe();
    let outcome = env.clock.start();

    assert_eq!(outcome, StartOutcome::Expired);
    assert_eq!(events.try_recv().unwrap(), ClockEvent::Expired);
    assert_eq!(env.clock.elapsed_seconds(), 0, "clock must not have started");
}

#[tokio::test]
async fn test_server_reconcile_can_expire_the_trial() {
    let env = TestEnv::new();
    env.session.set(trial_user());

    let outcome = env.clock.start();
    assert!(matches!(outcome, StartOutcome::Running { .. }));

    let mut events = env.clock.subscribe();
    env.clock.reconcile_server_elapsed(4000);

    // Server value won and crossed the threshold
    let persisted: TrialTimerState = env.cache.load(keys::TRIAL_TIMER).unwrap();
    assert_eq!(persisted.elapsed_seconds, 4000);
    assert!(persisted.has_expired);
    assert_eq!(events.try_recv().unwrap(), ClockEvent::Expired);
    assert!(env.gate.trial_consumed());
}

#[tokio::test]
async fn test_pause_persists_state_for_gap_computation() {
    let env = TestEnv::new();
    env.session.set(trial_user());

    env.clock.start();
    env.clock.pause();

    let persisted: TrialTimerState = env.cache.load(keys::TRIAL_TIMER).unwrap();
    assert!(!persisted.is_running);
    assert!(!persisted.has_expired);
}
