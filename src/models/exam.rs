// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exam session state machine, scoring, and the recent-activity list.

use crate::error::{AppError, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How many recent-activity entries we keep.
const RECENT_ACTIVITY_LIMIT: usize = 50;

/// Supported exam types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamType {
    #[serde(rename = "WAEC")]
    Waec,
    #[serde(rename = "JAMB")]
    Jamb,
}

impl ExamType {
    /// Exact number of subjects the exam requires.
    pub fn required_subject_count(&self) -> usize {
        match self {
            ExamType::Waec => 9,
            ExamType::Jamb => 4,
        }
    }

    /// Subjects that must be part of the selection.
    pub fn compulsory_subjects(&self) -> &'static [&'static str] {
        match self {
            ExamType::Waec => &["english", "mathematics"],
            ExamType::Jamb => &["english"],
        }
    }

    /// Total exam duration in seconds for a validated selection.
    pub fn duration_secs(&self, subjects: &[String]) -> u64 {
        if subjects.iter().any(|s| s == "english") {
            return 9000; // 2.5 hours when English is included
        }
        match self {
            ExamType::Waec => 8400,
            ExamType::Jamb => 7200,
        }
    }
}

impl std::fmt::Display for ExamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExamType::Waec => write!(f, "WAEC"),
            ExamType::Jamb => write!(f, "JAMB"),
        }
    }
}

/// Validate a subject selection locally, before any network call.
pub fn validate_subject_selection(exam_type: ExamType, subjects: &[String]) -> Result<()> {
    if subjects.is_empty() {
        return Err(AppError::Validation(
            "Please select at least one subject".to_string(),
        ));
    }

    let normalized: Vec<String> = subjects.iter().map(|s| s.trim().to_lowercase()).collect();
    let unique: HashSet<&String> = normalized.iter().collect();
    if unique.len() != normalized.len() {
        return Err(AppError::Validation(
            "Subject selection contains duplicates".to_string(),
        ));
    }

    let required = exam_type.required_subject_count();
    if normalized.len() != required {
        return Err(AppError::Validation(format!(
            "{} requires exactly {} subjects (currently {})",
            exam_type,
            required,
            normalized.len()
        )));
    }

    for compulsory in exam_type.compulsory_subjects() {
        if !normalized.iter().any(|s| s == compulsory) {
            return Err(AppError::Validation(format!(
                "{} is compulsory for {}",
                compulsory, exam_type
            )));
        }
    }

    Ok(())
}

/// A multiple-choice question as delivered by the question bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub subject: String,
    pub text: String,
    /// Choice label ("A".."D") to choice text.
    pub options: HashMap<String, String>,
    pub correct_answer: String,
}

/// Exam lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamPhase {
    NotStarted,
    InProgress,
    Submitted,
}

/// Signal from a countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    Running { remaining_seconds: u64 },
    /// The countdown hit zero on this tick. Reported once; the caller must
    /// auto-submit.
    TimeUp,
    /// Session is not in progress (already submitted or time-up consumed).
    Idle,
}

/// An in-progress exam.
///
/// Once started, the session's own countdown is authoritative: trial expiry
/// does not touch it. Access is checked at the start and submit boundaries
/// only.
#[derive(Debug, Clone)]
pub struct ExamSession {
    pub exam_type: ExamType,
    pub subjects: Vec<String>,
    pub questions: Vec<Question>,
    /// Question index to chosen option label.
    pub answers: HashMap<usize, String>,
    pub remaining_seconds: u64,
    pub started_at: DateTime<Utc>,
    phase: ExamPhase,
    time_up_signaled: bool,
}

impl ExamSession {
    /// Enter `InProgress`. The caller must have passed the access gate.
    pub fn start(
        exam_type: ExamType,
        subjects: Vec<String>,
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Self {
        let remaining_seconds = exam_type.duration_secs(&subjects);
        Self {
            exam_type,
            subjects,
            questions,
            answers: HashMap::new(),
            remaining_seconds,
            started_at: now,
            phase: ExamPhase::InProgress,
            time_up_signaled: false,
        }
    }

    pub fn phase(&self) -> ExamPhase {
        self.phase
    }

    pub fn is_in_progress(&self) -> bool {
        self.phase == ExamPhase::InProgress
    }

    /// Record (or replace) the answer for a question.
    pub fn record_answer(&mut self, index: usize, choice: String) -> Result<()> {
        if self.phase != ExamPhase::InProgress {
            return Err(AppError::Validation(
                "Exam is not in progress".to_string(),
            ));
        }
        if index >= self.questions.len() {
            return Err(AppError::Validation(format!(
                "Question index {} out of range",
                index
            )));
        }
        self.answers.insert(index, choice);
        Ok(())
    }

    /// One countdown second has passed.
    ///
    /// `TimeUp` is reported exactly once, when the counter reaches zero.
    pub fn apply_countdown_tick(&mut self) -> CountdownOutcome {
        if self.phase != ExamPhase::InProgress || self.time_up_signaled {
            return CountdownOutcome::Idle;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.time_up_signaled = true;
            return CountdownOutcome::TimeUp;
        }
        CountdownOutcome::Running {
            remaining_seconds: self.remaining_seconds,
        }
    }

    /// Transition to `Submitted`. Terminal; a second call is an error.
    pub fn finish(&mut self) -> Result<()> {
        if self.phase != ExamPhase::InProgress {
            return Err(AppError::Validation(
                "Exam has already been submitted".to_string(),
            ));
        }
        self.phase = ExamPhase::Submitted;
        Ok(())
    }

    /// Score the held answers against the held questions.
    ///
    /// Used when the submit call cannot reach the backend: the user still
    /// gets an outcome.
    pub fn score_locally(&self) -> LocalScore {
        let mut correct = 0u32;
        let mut subject_scores: HashMap<String, SubjectScore> = HashMap::new();

        for (index, question) in self.questions.iter().enumerate() {
            let entry = subject_scores
                .entry(question.subject.clone())
                .or_default();
            entry.total += 1;

            if let Some(answer) = self.answers.get(&index) {
                if *answer == question.correct_answer {
                    correct += 1;
                    entry.correct += 1;
                }
            }
        }

        let total = self.questions.len() as u32;
        let percentage = if total == 0 {
            0
        } else {
            (f64::from(correct) / f64::from(total) * 100.0).round() as u32
        };

        LocalScore {
            score: correct,
            total_questions: total,
            percentage,
            subject_scores,
        }
    }
}

/// Per-subject correct/total tally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectScore {
    pub correct: u32,
    pub total: u32,
}

/// Locally computed score.
#[derive(Debug, Clone)]
pub struct LocalScore {
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub subject_scores: HashMap<String, SubjectScore>,
}

/// A finished exam, as persisted and shown on the results page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResultRecord {
    pub exam_type: ExamType,
    pub subjects: Vec<String>,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub subject_scores: HashMap<String, SubjectScore>,
    pub time_taken_secs: u64,
    /// Calendar date of the attempt (YYYY-MM-DD).
    pub date: String,
    /// Server-assigned ID; absent for results scored offline.
    pub result_id: Option<String>,
    /// True when the backend never acknowledged this result.
    pub local_only: bool,
}

/// Bounded, deduplicated list of recent exam attempts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentActivity {
    pub entries: Vec<RecentActivityEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentActivityEntry {
    pub exam_type: ExamType,
    pub subjects: Vec<String>,
    pub score: u32,
    pub total_questions: u32,
    pub date: String,
    pub recorded_at: DateTime<Utc>,
}

impl RecentActivityEntry {
    /// Composite dedup key over type + subjects + score + total + date.
    pub fn dedup_key(&self) -> String {
        let mut subjects = self.subjects.clone();
        subjects.sort();
        let raw = format!(
            "{}|{}|{}|{}|{}",
            self.exam_type,
            subjects.join(","),
            self.score,
            self.total_questions,
            self.date
        );
        URL_SAFE_NO_PAD.encode(raw)
    }
}

impl RecentActivity {
    /// Insert at the front unless an identical attempt is already recorded.
    ///
    /// Returns false for duplicates. The list is truncated to the most
    /// recent 50 entries.
    pub fn record(&mut self, entry: RecentActivityEntry) -> bool {
        let key = entry.dedup_key();
        if self.entries.iter().any(|e| e.dedup_key() == key) {
            return false;
        }

        self.entries.insert(0, entry);
        self.entries.truncate(RECENT_ACTIVITY_LIMIT);
        true
    }
}
