// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exam session driver.
//!
//! Access is checked once, at start. A running exam is isolated from the
//! trial clock: its own countdown is authoritative, and trial expiry while
//! a paper is open never interrupts it. Submission always produces an
//! outcome, scoring locally when the backend is unreachable.

use crate::error::{AppError, Result};
use crate::models::exam::{
    validate_subject_selection, CountdownOutcome, ExamResultRecord, ExamSession, ExamType,
    RecentActivity, RecentActivityEntry,
};
use crate::models::sync::SyncCategory;
use crate::models::user::SessionStore;
use crate::services::backend::{ExamApi, QuestionsRequest, SubmitExamRequest};
use crate::services::gate::{AccessGate, Decision, DenyReason};
use crate::services::sync::SyncAgent;
use crate::store::{keys, DurableCache};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

/// Result of trying to start an exam.
#[derive(Debug, Clone)]
pub enum StartExamOutcome {
    Started {
        question_count: usize,
        duration_secs: u64,
    },
    /// The access gate said no; the caller should raise the activation
    /// prompt.
    Denied(Decision),
}

/// Runs at most one exam at a time.
#[derive(Clone)]
pub struct ExamService {
    api: ExamApi,
    gate: AccessGate,
    session: SessionStore,
    sync: SyncAgent,
    cache: DurableCache,
    current: Arc<Mutex<Option<ExamSession>>>,
    countdown: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ExamService {
    pub fn new(
        api: ExamApi,
        gate: AccessGate,
        session: SessionStore,
        sync: SyncAgent,
        cache: DurableCache,
    ) -> Self {
        Self {
            api,
            gate,
            session,
            sync,
            cache,
            current: Arc::new(Mutex::new(None)),
            countdown: Arc::new(Mutex::new(None)),
        }
    }

    /// Validate the selection, pass the gate, fetch questions, and enter
    /// `InProgress`.
    pub async fn start(
        &self,
        exam_type: ExamType,
        subjects: Vec<String>,
    ) -> Result<StartExamOutcome> {
        validate_subject_selection(exam_type, &subjects)?;

        let user = self
            .session
            .snapshot()
            .ok_or_else(|| AppError::Validation("Not logged in".to_string()))?;

        let decision = self.gate.check(&user);
        if !decision.allowed {
            tracing::info!(?decision, "Exam start blocked by access gate");
            return Ok(StartExamOutcome::Denied(decision));
        }

        // The local gate is a UX convenience; the backend owns enforcement.
        // Ask it too when reachable, but never block an offline start on it.
        match self.api.session_status().await {
            Ok(status) if !status.active => {
                tracing::info!("Backend reports inactive session, exam start blocked");
                return Ok(StartExamOutcome::Denied(Decision::denied(
                    DenyReason::TrialExpired,
                )));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Session status recheck skipped");
            }
        }

        if self.current.lock().expect("exam state poisoned").is_some() {
            return Err(AppError::Validation(
                "An exam is already in progress".to_string(),
            ));
        }

        let response = self
            .api
            .fetch_questions(&QuestionsRequest {
                exam_type,
                subjects: subjects.clone(),
            })
            .await?;
        if !response.success || response.questions.is_empty() {
            return Err(AppError::Backend(
                response
                    .message
                    .unwrap_or_else(|| "Question bank returned no questions".to_string()),
            ));
        }

        let exam = ExamSession::start(exam_type, subjects, response.questions, Utc::now());
        let question_count = exam.questions.len();
        let duration_secs = exam.remaining_seconds;

        tracing::info!(%exam_type, question_count, duration_secs, "Exam started");
        *self.current.lock().expect("exam state poisoned") = Some(exam);
        self.spawn_countdown();

        Ok(StartExamOutcome::Started {
            question_count,
            duration_secs,
        })
    }

    /// Record an answer for the in-progress exam.
    pub fn record_answer(&self, index: usize, choice: String) -> Result<()> {
        let mut guard = self.current.lock().expect("exam state poisoned");
        let exam = guard
            .as_mut()
            .ok_or_else(|| AppError::Validation("No exam in progress".to_string()))?;
        exam.record_answer(index, choice)
    }

    pub fn remaining_seconds(&self) -> Option<u64> {
        self.current
            .lock()
            .expect("exam state poisoned")
            .as_ref()
            .map(|e| e.remaining_seconds)
    }

    /// Submit the in-progress exam.
    ///
    /// Server scoring is preferred; any failure to get a scored response
    /// falls back to local scoring with the result flagged `local_only` and
    /// staged for later sync. Either way the session ends `Submitted`.
    pub async fn submit(&self) -> Result<ExamResultRecord> {
        self.abort_countdown();

        let mut exam = {
            let mut guard = self.current.lock().expect("exam state poisoned");
            guard
                .take()
                .ok_or_else(|| AppError::Validation("No exam in progress".to_string()))?
        };

        let now = Utc::now();
        let time_taken_secs = (now - exam.started_at).num_seconds().max(0) as u64;
        let date = now.format("%Y-%m-%d").to_string();

        let request = SubmitExamRequest {
            exam_type: exam.exam_type,
            subjects: exam.subjects.clone(),
            user_answers: exam.answers.clone(),
            questions: exam.questions.clone(),
            time_taken: time_taken_secs,
        };

        exam.finish()?;

        let record = match self.api.submit_exam(&request).await {
            Ok(response) if response.success => {
                tracing::info!(score = response.score, "Exam scored by backend");
                ExamResultRecord {
                    exam_type: exam.exam_type,
                    subjects: exam.subjects.clone(),
                    score: response.score,
                    total_questions: exam.questions.len() as u32,
                    percentage: response.percentage,
                    subject_scores: response.subject_scores,
                    time_taken_secs,
                    date,
                    result_id: response.result_id,
                    local_only: false,
                }
            }
            Ok(response) => {
                tracing::warn!(message = ?response.message, "Submit rejected, scoring locally");
                self.local_record(&exam, time_taken_secs, date)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Submit unreachable, scoring locally");
                self.local_record(&exam, time_taken_secs, date)
            }
        };

        self.store_result(&record);
        Ok(record)
    }

    /// Discard the in-progress exam without scoring.
    pub fn abandon(&self) {
        self.abort_countdown();
        if self
            .current
            .lock()
            .expect("exam state poisoned")
            .take()
            .is_some()
        {
            tracing::info!("Exam abandoned");
        }
    }

    fn local_record(
        &self,
        exam: &ExamSession,
        time_taken_secs: u64,
        date: String,
    ) -> ExamResultRecord {
        let score = exam.score_locally();
        ExamResultRecord {
            exam_type: exam.exam_type,
            subjects: exam.subjects.clone(),
            score: score.score,
            total_questions: score.total_questions,
            percentage: score.percentage,
            subject_scores: score.subject_scores,
            time_taken_secs,
            date,
            result_id: None,
            local_only: true,
        }
    }

    /// Persist the result, update the recent-activity list, and stage
    /// locally-scored results for sync.
    fn store_result(&self, record: &ExamResultRecord) {
        let mut results: Vec<ExamResultRecord> =
            self.cache.load(keys::EXAM_RESULTS).unwrap_or_default();
        results.push(record.clone());
        self.cache.save(keys::EXAM_RESULTS, &results);

        let mut recent: RecentActivity = self
            .cache
            .load(keys::RECENT_ACTIVITY)
            .unwrap_or_default();
        let fresh = recent.record(RecentActivityEntry {
            exam_type: record.exam_type,
            subjects: record.subjects.clone(),
            score: record.score,
            total_questions: record.total_questions,
            date: record.date.clone(),
            recorded_at: Utc::now(),
        });
        if fresh {
            self.cache.save(keys::RECENT_ACTIVITY, &recent);
        }

        if record.local_only {
            match serde_json::to_value(record) {
                Ok(payload) => self.sync.buffer_change(SyncCategory::ExamResults, payload),
                Err(e) => tracing::warn!(error = %e, "Failed to stage result for sync"),
            }
        }
    }

    /// The exam's own 1 Hz countdown, independent of the trial clock (which
    /// stops at expiry and does not run at all for activated users).
    fn spawn_countdown(&self) {
        self.abort_countdown();

        let service = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;

            loop {
                interval.tick().await;

                let outcome = {
                    let mut guard = service.current.lock().expect("exam state poisoned");
                    match guard.as_mut() {
                        Some(exam) => exam.apply_countdown_tick(),
                        None => break,
                    }
                };

                match outcome {
                    CountdownOutcome::Running { .. } => {}
                    CountdownOutcome::TimeUp => {
                        // Drop our own handle first: submit() aborts the
                        // countdown task, and that must not cancel this
                        // in-flight auto-submit.
                        service
                            .countdown
                            .lock()
                            .expect("countdown handle poisoned")
                            .take();
                        tracing::info!("Exam time up, auto-submitting");
                        if let Err(e) = service.submit().await {
                            tracing::warn!(error = %e, "Auto-submit failed");
                        }
                        break;
                    }
                    CountdownOutcome::Idle => break,
                }
            }
        });

        *self.countdown.lock().expect("countdown handle poisoned") = Some(handle);
    }

    fn abort_countdown(&self) {
        if let Some(handle) = self
            .countdown
            .lock()
            .expect("countdown handle poisoned")
            .take()
        {
            handle.abort();
        }
    }
}
