// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MSH-Prep client runtime.
//!
//! Wires the components together, restores any persisted session, runs the
//! trial clock, and keeps the sync agent reconciling in the background
//! until shutdown.

use mshprep::{
    config::{Config, TRIAL_ALLOTMENT_SECS},
    models::user::{SessionStore, UserStatus},
    pages::{Page, PageController},
    services::{AccessGate, ClockEvent, Connectivity, ExamApi, StartOutcome, SyncAgent, TrialClock},
    store::DurableCache,
    time_utils::format_clock,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Everything here is timer callbacks and short network calls interleaving
// cooperatively; one thread is plenty.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(backend = %config.backend_url, "Starting MSH-Prep client");

    let cache = match &config.cache_dir {
        Some(dir) => DurableCache::new(dir),
        None => DurableCache::new_in_memory(),
    };
    if !cache.is_persistent() {
        tracing::warn!("Cache is not persistent, state will not survive restarts");
    }

    let api = ExamApi::new(&config.backend_url);
    let session = SessionStore::new(cache.clone());
    let gate = AccessGate::new(cache.clone(), session.clone());
    let clock = TrialClock::new(
        cache.clone(),
        api.clone(),
        gate.clone(),
        config.persist_interval_secs,
    );
    let connectivity = Connectivity::new_online();
    let sync = SyncAgent::new(
        cache.clone(),
        api.clone(),
        connectivity.clone(),
        clock.clone(),
        config.sync_debounce_secs,
    );

    let state = Arc::new(AppState {
        config,
        cache,
        api: api.clone(),
        session: session.clone(),
        gate: gate.clone(),
        clock: clock.clone(),
        sync: sync.clone(),
    });

    let controller = PageController::new(gate.clone(), session.clone(), sync.clone());

    // Restore any persisted session and start the trial clock when the
    // user is still in their trial.
    match state.session.snapshot() {
        Some(user) => {
            tracing::info!(email = %user.email, status = ?user.status, "Restored user session");

            let landing = controller.navigate(Page::Dashboard);
            if landing.redirected {
                tracing::warn!(landed = ?landing.page, "Access check failed, activation required");
            } else if user.status == UserStatus::Trial {
                match state.clock.start() {
                    StartOutcome::Running { elapsed_seconds } => {
                        tracing::info!(
                            remaining = %format_clock(TRIAL_ALLOTMENT_SECS.saturating_sub(elapsed_seconds)),
                            "Trial clock running"
                        );
                    }
                    StartOutcome::Expired => {
                        tracing::warn!("Trial expired on resume, activation required");
                    }
                }
            }
        }
        None => tracing::info!("No persisted session, login required"),
    }

    // Periodic flushes ride the trial clock's ticks; reconcile once now.
    let _sync_driver = state.sync.run_on_clock();
    if let Err(e) = state.sync.pull().await {
        tracing::debug!(error = %e, "Startup reconcile skipped");
    }

    let mut events = state.clock.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(ClockEvent::Tick { elapsed_seconds }) if elapsed_seconds % 60 == 0 => {
                    tracing::info!(
                        remaining = %format_clock(TRIAL_ALLOTMENT_SECS.saturating_sub(elapsed_seconds)),
                        "Trial time remaining"
                    );
                }
                Ok(ClockEvent::Tick { .. }) => {}
                Ok(ClockEvent::Expired) => {
                    tracing::warn!("Trial expired - activation required to continue");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    tracing::info!("Shutting down");
    state.clock.pause(); // persists elapsed time for the next start
    if let Err(e) = state.sync.flush().await {
        tracing::debug!(error = %e, "Final flush skipped");
    }
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mshprep=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
