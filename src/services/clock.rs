// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trial clock: drives the one-hour trial timer.
//!
//! Owns the only interval scheduler in the app. Other components subscribe
//! to [`ClockEvent`]s instead of setting up timers of their own, so a
//! re-initialization can never leave duplicate tickers running.
//!
//! The per-second callback never awaits: persistence is a synchronous cache
//! write and the backend push is spawned fire-and-forget, so a slow network
//! cannot stall the tick sequence.

use crate::device;
use crate::models::trial::TrialTimerState;
use crate::services::backend::{ExamApi, TrialPushRequest};
use crate::services::gate::AccessGate;
use crate::store::{keys, DurableCache};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

/// Events fanned out to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    Tick { elapsed_seconds: u64 },
    /// Sent exactly once per trial lifetime, on the threshold crossing.
    Expired,
}

/// Result of trying to start the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Running { elapsed_seconds: u64 },
    /// The trial is terminally over (marker set, or the resume gap crossed
    /// the threshold). The clock did not start.
    Expired,
}

struct ClockShared {
    state: Mutex<Option<TrialTimerState>>,
    cache: DurableCache,
    api: ExamApi,
    gate: AccessGate,
    events: broadcast::Sender<ClockEvent>,
    device_id: String,
    persist_interval_secs: u64,
}

impl ClockShared {
    fn persist(&self, snapshot: &TrialTimerState) {
        self.cache.save(keys::TRIAL_TIMER, snapshot);
    }

    /// Push elapsed time to the backend without blocking the caller.
    fn spawn_push(&self, elapsed_seconds: u64) {
        let api = self.api.clone();
        let req = TrialPushRequest {
            elapsed_seconds,
            device_id: self.device_id.clone(),
        };
        tokio::spawn(async move {
            match api.push_trial_elapsed(&req).await {
                Ok(_) => {}
                Err(e) if e.is_offline() => {
                    tracing::debug!("Trial push skipped (offline)");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Trial push failed");
                }
            }
        });
    }

    /// Terminal expiry: permanent marker via the gate, then the one
    /// `Expired` event.
    fn apply_expiry(&self) {
        self.gate.mark_trial_consumed();
        let _ = self.events.send(ClockEvent::Expired);
    }
}

/// Handle to the trial clock. Cheap to clone.
#[derive(Clone)]
pub struct TrialClock {
    shared: Arc<ClockShared>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TrialClock {
    pub fn new(
        cache: DurableCache,
        api: ExamApi,
        gate: AccessGate,
        persist_interval_secs: u64,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        let device_id = device::device_id(&cache);
        Self {
            shared: Arc::new(ClockShared {
                state: Mutex::new(None),
                cache,
                api,
                gate,
                events,
                device_id,
                persist_interval_secs,
            }),
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    /// Subscribe to tick/expiry events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClockEvent> {
        self.shared.events.subscribe()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.lock_state()
            .as_ref()
            .map_or(0, |s| s.elapsed_seconds)
    }

    pub fn snapshot(&self) -> Option<TrialTimerState> {
        self.lock_state().clone()
    }

    /// Start (or resume) the trial clock for a trial user.
    ///
    /// With a persisted, non-expired state the wall-clock gap since the
    /// last update is charged first, which may expire the trial right here.
    /// With the expired marker set, the clock refuses to start at all.
    pub fn start(&self) -> StartOutcome {
        if self.shared.gate.trial_consumed() {
            tracing::info!("Trial already consumed, clock will not start");
            let _ = self.shared.events.send(ClockEvent::Expired);
            return StartOutcome::Expired;
        }

        let now = Utc::now();
        let persisted: Option<TrialTimerState> = self.shared.cache.load(keys::TRIAL_TIMER);

        let (state, expired_now) = match persisted {
            Some(prior) if prior.has_expired => {
                // Timer says expired but the marker is missing; restore it.
                self.shared.apply_expiry();
                return StartOutcome::Expired;
            }
            Some(mut prior) => {
                let outcome = prior.resume_from(now);
                tracing::info!(
                    elapsed = outcome.elapsed_seconds,
                    "Resuming persisted trial timer"
                );
                (prior, outcome.expired_now)
            }
            None => {
                tracing::info!("Starting fresh trial timer");
                (TrialTimerState::fresh(now), false)
            }
        };

        self.shared.persist(&state);
        let elapsed = state.elapsed_seconds;
        *self.lock_state() = Some(state);

        if expired_now {
            self.shared.apply_expiry();
            return StartOutcome::Expired;
        }

        self.spawn_ticker();
        StartOutcome::Running {
            elapsed_seconds: elapsed,
        }
    }

    /// Pause ticking (tab hidden). Persists the pause timestamp immediately
    /// so the next resume computes the gap from here.
    pub fn pause(&self) {
        self.abort_ticker();
        let mut guard = self.lock_state();
        if let Some(state) = guard.as_mut() {
            state.apply_pause(Utc::now());
            self.shared.persist(state);
            tracing::debug!(elapsed = state.elapsed_seconds, "Trial clock paused");
        }
    }

    /// Resume ticking (tab visible again), charging the hidden gap.
    pub fn resume(&self) {
        let expired_now = {
            let mut guard = self.lock_state();
            let Some(state) = guard.as_mut() else {
                return;
            };
            if state.has_expired {
                return;
            }
            let outcome = state.resume_from(Utc::now());
            self.shared.persist(state);
            tracing::debug!(elapsed = outcome.elapsed_seconds, "Trial clock resumed");
            outcome.expired_now
        };

        if expired_now {
            self.shared.apply_expiry();
        } else {
            self.spawn_ticker();
        }
    }

    /// Apply the server-reported elapsed value (server wins).
    pub fn reconcile_server_elapsed(&self, server_elapsed: u64) {
        let expired_now = {
            let mut guard = self.lock_state();
            let Some(state) = guard.as_mut() else {
                return;
            };
            if state.has_expired {
                return;
            }
            let outcome = state.reconcile_server_elapsed(server_elapsed, Utc::now());
            self.shared.persist(state);
            tracing::info!(
                server_elapsed,
                "Reconciled trial elapsed with server value"
            );
            outcome.expired_now
        };

        if expired_now {
            self.abort_ticker();
            self.shared.apply_expiry();
        }
    }

    /// Stop ticking and forget in-memory state (logout, activation).
    pub fn reset(&self) {
        self.abort_ticker();
        *self.lock_state() = None;
    }

    fn spawn_ticker(&self) {
        self.abort_ticker();

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // first tick fires immediately; skip it

            loop {
                interval.tick().await;
                let now = Utc::now();

                let (outcome, snapshot) = {
                    let mut guard = shared.state.lock().expect("trial clock state poisoned");
                    match guard.as_mut() {
                        Some(state) if state.is_running => {
                            let outcome = state.apply_tick(now);
                            (outcome, state.clone())
                        }
                        _ => break,
                    }
                };

                let _ = shared.events.send(ClockEvent::Tick {
                    elapsed_seconds: outcome.elapsed_seconds,
                });

                if outcome.expired_now {
                    shared.persist(&snapshot);
                    shared.apply_expiry();
                    break;
                }

                if outcome.elapsed_seconds % shared.persist_interval_secs == 0 {
                    shared.persist(&snapshot);
                    shared.spawn_push(outcome.elapsed_seconds);
                }
            }
        });

        *self.ticker.lock().expect("ticker handle poisoned") = Some(handle);
    }

    fn abort_ticker(&self) {
        if let Some(handle) = self.ticker.lock().expect("ticker handle poisoned").take() {
            handle.abort();
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, Option<TrialTimerState>> {
        self.shared.state.lock().expect("trial clock state poisoned")
    }
}
