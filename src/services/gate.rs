// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access gate: the single source of truth for "may this user use
//! protected features right now".
//!
//! The decision logic is a pure function over the session, the timer state,
//! and the expired marker; the [`AccessGate`] service wraps it with cache
//! access and owns the one transition that makes denial permanent.

use crate::config::TRIAL_ALLOTMENT_SECS;
use crate::models::trial::{TrialExpiredMarker, TrialTimerState};
use crate::models::user::{SessionStore, UserSession, UserStatus};
use crate::store::{keys, DurableCache};
use chrono::Utc;

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The trial has been consumed; only activation restores access.
    TrialConsumed,
    /// The trial allotment ran out on this evaluation.
    TrialExpired,
}

/// Gate verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: Option<DenyReason>,
}

impl Decision {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn denied(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Evaluate the access rules, in order:
///
/// 1. an expired marker denies, overriding everything (one trial per
///    account, ever — a fresh-looking timer does not help);
/// 2. an activated account is allowed;
/// 3. a trial account with time remaining is allowed;
/// 4. everything else is denied as `TrialExpired`.
pub fn evaluate(
    session: &UserSession,
    timer: &TrialTimerState,
    marker: Option<&TrialExpiredMarker>,
) -> Decision {
    if marker.is_some_and(|m| m.expired) {
        return Decision::denied(DenyReason::TrialConsumed);
    }

    match session.status {
        UserStatus::Activated => Decision::allowed(),
        UserStatus::Trial
            if !timer.has_expired && timer.elapsed_seconds < TRIAL_ALLOTMENT_SECS =>
        {
            Decision::allowed()
        }
        _ => Decision::denied(DenyReason::TrialExpired),
    }
}

/// Cache-backed gate service.
#[derive(Clone)]
pub struct AccessGate {
    cache: DurableCache,
    session: SessionStore,
}

impl AccessGate {
    pub fn new(cache: DurableCache, session: SessionStore) -> Self {
        Self { cache, session }
    }

    /// Evaluate against persisted timer state and marker.
    ///
    /// A `TrialExpired` verdict transitions into the permanent-denial state:
    /// the expired marker is written here, exactly once, and the user
    /// snapshot is downgraded.
    pub fn check(&self, session: &UserSession) -> Decision {
        let timer: TrialTimerState = self
            .cache
            .load(keys::TRIAL_TIMER)
            .unwrap_or_else(|| TrialTimerState::fresh(Utc::now()));
        let marker: Option<TrialExpiredMarker> = self.cache.load(keys::TRIAL_EXPIRED);

        let decision = evaluate(session, &timer, marker.as_ref());

        if decision.reason == Some(DenyReason::TrialExpired) && marker.is_none() {
            self.mark_trial_consumed();
        }

        decision
    }

    /// Write the permanent expired marker and downgrade the user snapshot.
    ///
    /// Shared by the evaluate path above and the trial clock's threshold
    /// crossing.
    pub fn mark_trial_consumed(&self) {
        let now = Utc::now();
        tracing::info!("Trial consumed, writing permanent expired marker");
        self.cache
            .save(keys::TRIAL_EXPIRED, &TrialExpiredMarker::consumed_at(now));
        self.session.update(|s| {
            s.status = UserStatus::Expired;
            s.has_access = false;
        });
    }

    /// True if the permanent marker is present.
    pub fn trial_consumed(&self) -> bool {
        self.cache
            .load::<TrialExpiredMarker>(keys::TRIAL_EXPIRED)
            .is_some_and(|m| m.expired)
    }

    /// Undo the terminal state after a successful server-validated
    /// activation: clear the marker and the timer, upgrade the session.
    pub fn reset_on_activation(&self) {
        tracing::info!("Activation accepted, clearing trial gate state");
        self.cache.remove(keys::TRIAL_EXPIRED);
        self.cache.remove(keys::TRIAL_TIMER);
        self.session.update(|s| {
            s.status = UserStatus::Activated;
            s.has_access = true;
        });
    }
}
