//! Trial timer state and its transition rules.
//!
//! The transitions are pure functions over an injected `now`, so the whole
//! state machine is testable without a runtime or a real clock. The async
//! driver lives in `services::clock`.

use crate::config::TRIAL_ALLOTMENT_SECS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of applying a transition to the timer.
#[derive(Debug, Clone, Copy)]
pub struct TickOutcome {
    /// True only on the transition that crossed the allotment threshold.
    /// Every later transition reports false, so expiry is edge-triggered.
    pub expired_now: bool,
    pub elapsed_seconds: u64,
}

/// Elapsed-time accounting for the one-hour trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialTimerState {
    pub started_at: Option<DateTime<Utc>>,
    /// Monotonically non-decreasing while the trial is active.
    pub elapsed_seconds: u64,
    pub last_update_at: DateTime<Utc>,
    pub is_running: bool,
    /// Set once when the threshold is crossed; cleared only by activation.
    pub has_expired: bool,
}

impl TrialTimerState {
    /// Fresh timer for a user entering their trial.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            started_at: Some(now),
            elapsed_seconds: 0,
            last_update_at: now,
            is_running: true,
            has_expired: false,
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        TRIAL_ALLOTMENT_SECS.saturating_sub(self.elapsed_seconds)
    }

    /// One wall-clock second has passed.
    ///
    /// No-op when paused or already expired.
    pub fn apply_tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.has_expired || !self.is_running {
            return self.outcome(false);
        }

        self.elapsed_seconds += 1;
        self.last_update_at = now;
        let expired_now = self.check_threshold();
        self.outcome(expired_now)
    }

    /// Resume after a pause, reload, or sleep, charging the wall-clock gap.
    ///
    /// A gap that pushes elapsed past the allotment expires the trial here,
    /// immediately, not on the next natural tick. Negative gaps (device
    /// clock moved backwards) are clamped to zero so elapsed never
    /// decreases.
    pub fn resume_from(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.has_expired {
            return self.outcome(false);
        }

        let gap = (now - self.last_update_at).num_seconds().max(0) as u64;
        self.elapsed_seconds += gap;
        self.last_update_at = now;
        self.is_running = true;
        let expired_now = self.check_threshold();
        self.outcome(expired_now)
    }

    /// Pause (tab hidden). Records the timestamp so the next resume can
    /// compute the gap.
    pub fn apply_pause(&mut self, now: DateTime<Utc>) {
        if self.has_expired {
            return;
        }
        self.is_running = false;
        self.last_update_at = now;
    }

    /// Overwrite elapsed with the server-reported value.
    ///
    /// The server is authoritative for elapsed time when reachable; a jump
    /// past the allotment expires through the same edge-triggered path as a
    /// tick.
    pub fn reconcile_server_elapsed(&mut self, server_elapsed: u64, now: DateTime<Utc>) -> TickOutcome {
        if self.has_expired {
            return self.outcome(false);
        }

        self.elapsed_seconds = server_elapsed;
        self.last_update_at = now;
        let expired_now = self.check_threshold();
        self.outcome(expired_now)
    }

    /// Stop the clock if the allotment has been crossed. Returns true only
    /// on the crossing transition.
    fn check_threshold(&mut self) -> bool {
        if self.has_expired || self.elapsed_seconds < TRIAL_ALLOTMENT_SECS {
            return false;
        }
        self.has_expired = true;
        self.is_running = false;
        true
    }

    fn outcome(&self, expired_now: bool) -> TickOutcome {
        TickOutcome {
            expired_now,
            elapsed_seconds: self.elapsed_seconds,
        }
    }
}

/// Permanent record that the trial has been fully consumed.
///
/// Kept separate from [`TrialTimerState`]: wiping or resetting the timer
/// must not restore access. Only a successful server-validated activation
/// clears this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialExpiredMarker {
    pub expired: bool,
    pub expired_at: DateTime<Utc>,
    pub cannot_restart: bool,
}

impl TrialExpiredMarker {
    pub fn consumed_at(now: DateTime<Utc>) -> Self {
        Self {
            expired: true,
            expired_at: now,
            cannot_restart: true,
        }
    }
}
