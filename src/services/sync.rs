// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync agent: best-effort, debounced reconciliation of locally buffered
//! state with the backend.
//!
//! Everything here is tolerant of being skipped entirely: offline flushes
//! are no-ops, failed flushes leave entries staged for the next trigger,
//! and the user interface never waits on any of it.

use crate::error::Result;
use crate::models::exam::ExamResultRecord;
use crate::models::sync::{SyncBuffer, SyncCategory};
use crate::services::backend::{ExamApi, SyncPushRequest};
use crate::services::clock::{ClockEvent, TrialClock};
use crate::store::{keys, DurableCache};
use chrono::Utc;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// How many detailed result fetches run at once during a pull.
const MAX_CONCURRENT_PULLS: usize = 8;

/// How often (in clock seconds) the periodic flush fires.
const PERIODIC_FLUSH_SECS: u64 = 60;

/// Shared connectivity flag, flipped by whoever observes online/offline
/// transitions.
#[derive(Clone)]
pub struct Connectivity(Arc<AtomicBool>);

impl Connectivity {
    pub fn new_online() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn set_online(&self, online: bool) {
        let was = self.0.swap(online, Ordering::Relaxed);
        if was != online {
            tracing::info!(online, "Connectivity changed");
        }
    }

    pub fn is_online(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Debounced background synchronizer.
#[derive(Clone)]
pub struct SyncAgent {
    cache: DurableCache,
    api: ExamApi,
    connectivity: Connectivity,
    clock: TrialClock,
    debounce: Arc<Mutex<Option<JoinHandle<()>>>>,
    debounce_secs: u64,
}

impl SyncAgent {
    pub fn new(
        cache: DurableCache,
        api: ExamApi,
        connectivity: Connectivity,
        clock: TrialClock,
        debounce_secs: u64,
    ) -> Self {
        Self {
            cache,
            api,
            connectivity,
            clock,
            debounce: Arc::new(Mutex::new(None)),
            debounce_secs,
        }
    }

    fn load_buffer(&self) -> SyncBuffer {
        self.cache.load(keys::SYNC_BUFFER).unwrap_or_default()
    }

    /// Stage a change and (re)schedule the debounced flush.
    ///
    /// Staging the same category again within the window coalesces into one
    /// outbound payload carrying the latest value.
    pub fn buffer_change(&self, category: SyncCategory, payload: serde_json::Value) {
        // Re-read before mutating: a flush may have marked siblings synced
        // since our last look at the buffer.
        let mut buffer = self.load_buffer();
        buffer.stage(category, payload, Utc::now());
        self.cache.save(keys::SYNC_BUFFER, &buffer);
        tracing::debug!(?category, "Buffered change for sync");

        self.schedule_flush();
    }

    /// Arm (or re-arm) the debounce timer. A pending timer is replaced, so
    /// the flush fires once, after the window of inactivity.
    pub fn schedule_flush(&self) {
        let mut guard = self.debounce.lock().expect("debounce handle poisoned");
        if let Some(pending) = guard.take() {
            pending.abort();
        }

        let agent = self.clone();
        *guard = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(agent.debounce_secs)).await;
            if let Err(e) = agent.flush().await {
                tracing::debug!(error = %e, "Debounced flush failed, entries stay staged");
            }
        }));
    }

    /// Send all unsynced entries in one request.
    ///
    /// Offline is a clean no-op. On acknowledgment, entries are re-read and
    /// only those unchanged since the send are marked synced.
    pub async fn flush(&self) -> Result<()> {
        if !self.connectivity.is_online() {
            tracing::debug!("Offline, skipping sync flush");
            return Ok(());
        }

        let pending = self.load_buffer().unsynced();
        if pending.is_empty() {
            return Ok(());
        }

        let entries: HashMap<SyncCategory, serde_json::Value> = pending
            .iter()
            .map(|(category, entry)| (*category, entry.payload.clone()))
            .collect();

        let response = self.api.push_sync_buffer(&SyncPushRequest { entries }).await?;
        if !response.success {
            tracing::warn!("Sync push rejected by backend, will retry");
            return Ok(());
        }

        let flushed: Vec<_> = pending
            .iter()
            .map(|(category, entry)| (*category, entry.last_updated_at))
            .collect();

        let mut buffer = self.load_buffer();
        buffer.mark_synced(&flushed, Utc::now());
        self.cache.save(keys::SYNC_BUFFER, &buffer);

        tracing::info!(count = flushed.len(), "Sync buffer flushed");
        Ok(())
    }

    /// Pull server-authoritative state and reconcile local divergence.
    ///
    /// The server's trial elapsed value wins outright: client-counted time
    /// is an estimate a hostile clock can skew, server time is not.
    pub async fn pull(&self) -> Result<()> {
        if !self.connectivity.is_online() {
            tracing::debug!("Offline, skipping sync pull");
            return Ok(());
        }

        match self.api.trial_status().await {
            Ok(status) if status.trial_active => {
                self.clock.reconcile_server_elapsed(status.elapsed_seconds);
            }
            Ok(_) => {}
            Err(e) if e.is_offline() => return Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Trial status pull failed");
            }
        }

        let pulled = self.api.pull_buffer().await?;
        if pulled.exam_results.is_empty() {
            return Ok(());
        }

        let mut results: Vec<ExamResultRecord> =
            self.cache.load(keys::EXAM_RESULTS).unwrap_or_default();

        let missing: Vec<String> = pulled
            .exam_results
            .iter()
            .filter(|summary| {
                !results
                    .iter()
                    .any(|r| r.result_id.as_deref() == Some(summary.result_id.as_str()))
            })
            .map(|summary| summary.result_id.clone())
            .collect();

        let details: Vec<_> = stream::iter(missing)
            .map(|id| {
                let api = self.api.clone();
                async move { api.exam_result(&id).await }
            })
            .buffer_unordered(MAX_CONCURRENT_PULLS)
            .collect()
            .await;

        let mut added = 0usize;
        for detail in details {
            match detail {
                Ok(d) => {
                    results.push(ExamResultRecord {
                        exam_type: d.exam_type,
                        subjects: d.subjects,
                        score: d.score,
                        total_questions: d.total_questions,
                        percentage: d.percentage,
                        subject_scores: d.subject_scores,
                        time_taken_secs: 0,
                        date: d.date,
                        result_id: Some(d.result_id),
                        local_only: false,
                    });
                    added += 1;
                }
                Err(e) => tracing::warn!(error = %e, "Result detail fetch failed"),
            }
        }

        if added > 0 {
            self.cache.save(keys::EXAM_RESULTS, &results);
            tracing::info!(added, "Pulled exam results from server");
        }

        Ok(())
    }

    /// Connectivity came back: flush immediately, then reconcile.
    pub async fn on_online(&self) {
        self.connectivity.set_online(true);
        if let Err(e) = self.flush().await {
            tracing::debug!(error = %e, "Flush on reconnect failed");
        }
        if let Err(e) = self.pull().await {
            tracing::debug!(error = %e, "Pull on reconnect failed");
        }
    }

    /// Drive periodic flushes off the trial clock's tick events instead of
    /// owning a second interval timer.
    pub fn run_on_clock(&self) -> JoinHandle<()> {
        let agent = self.clone();
        let mut events = self.clock.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ClockEvent::Tick { elapsed_seconds })
                        if elapsed_seconds % PERIODIC_FLUSH_SECS == 0 =>
                    {
                        if let Err(e) = agent.flush().await {
                            tracing::debug!(error = %e, "Periodic flush failed");
                        }
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
