// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exam backend API client.
//!
//! Thin typed wrappers over the backend's JSON routes. Auth, scoring, and
//! code validation all happen server-side; this client only shapes requests
//! and funnels transport/status failures into [`AppError::Backend`].

use crate::error::{AppError, Result};
use crate::models::exam::{ExamType, Question, SubjectScore};
use crate::models::sync::SyncCategory;
use crate::models::user::UserStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Exam backend client.
///
/// `new_mock()` builds an offline client whose calls fail with
/// [`AppError::OFFLINE`]; callers are expected to fall back to cached state.
#[derive(Clone)]
pub struct ExamApi {
    http: Option<reqwest::Client>,
    base_url: String,
}

impl ExamApi {
    /// Create a client for the given backend base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Some(reqwest::Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create an offline client for testing (all calls fail).
    pub fn new_mock() -> Self {
        Self {
            http: None,
            base_url: "http://mock.invalid".to_string(),
        }
    }

    fn get_http(&self) -> Result<&reqwest::Client> {
        self.http
            .as_ref()
            .ok_or_else(|| AppError::Backend(AppError::OFFLINE.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    // ─── Session & Trial ─────────────────────────────────────────

    /// Current account standing as the server sees it.
    pub async fn session_status(&self) -> Result<SessionStatusResponse> {
        self.get_json("api/session-status").await
    }

    /// Fire-and-forget push of locally counted trial time.
    pub async fn push_trial_elapsed(&self, req: &TrialPushRequest) -> Result<AckResponse> {
        self.post_json("api/trial-timer", req).await
    }

    /// Server-authoritative trial elapsed time.
    pub async fn trial_status(&self) -> Result<TrialStatusResponse> {
        self.get_json("api/trial-status").await
    }

    /// Redeem an activation code. Format is validated locally first; the
    /// server validates the code itself.
    pub async fn activate(&self, req: &ActivateRequest) -> Result<ActivateResponse> {
        self.post_json("api/activate", req).await
    }

    // ─── Sync ────────────────────────────────────────────────────

    /// Push all unsynced buffer entries in one request.
    pub async fn push_sync_buffer(&self, req: &SyncPushRequest) -> Result<AckResponse> {
        self.post_json("api/sync-buffer", req).await
    }

    /// Fetch server-side copies of exam results for reconciliation.
    pub async fn pull_buffer(&self) -> Result<PullResponse> {
        self.get_json("api/pull-buffer").await
    }

    // ─── Exams ───────────────────────────────────────────────────

    /// Fetch the question set for a validated selection.
    pub async fn fetch_questions(&self, req: &QuestionsRequest) -> Result<QuestionsResponse> {
        self.post_json("api/get-questions", req).await
    }

    /// Submit a finished exam for scoring.
    pub async fn submit_exam(&self, req: &SubmitExamRequest) -> Result<SubmitExamResponse> {
        self.post_json("api/submit-exam", req).await
    }

    /// Detailed record for a previously submitted exam.
    pub async fn exam_result(&self, result_id: &str) -> Result<ExamResultDetail> {
        self.get_json(&format!("api/exam-results/{}", result_id)).await
    }

    // ─── Auth (opaque) ───────────────────────────────────────────

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.post_json("api/login", req).await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.post_json("api/register", req).await
    }

    pub async fn logout(&self) -> Result<AckResponse> {
        self.post_json("api/logout", &serde_json::json!({})).await
    }

    // ─── Plumbing ────────────────────────────────────────────────

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let response = self
            .get_http()?
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    async fn post_json<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .get_http()?
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
    }
}

// ─────────────────────────────────────────────────────────────────
// Request / response types
// ─────────────────────────────────────────────────────────────────

/// Server view of the current session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionStatusResponse {
    pub active: bool,
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub remaining_seconds: u64,
    #[serde(default)]
    pub is_admin: bool,
}

/// Locally counted trial time, pushed periodically.
#[derive(Debug, Clone, Serialize)]
pub struct TrialPushRequest {
    pub elapsed_seconds: u64,
    pub device_id: String,
}

/// Generic success acknowledgment.
#[derive(Debug, Clone, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Server-authoritative trial standing.
#[derive(Debug, Clone, Deserialize)]
pub struct TrialStatusResponse {
    pub trial_active: bool,
    pub elapsed_seconds: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivateRequest {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivateResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncPushRequest {
    pub entries: HashMap<SyncCategory, serde_json::Value>,
}

/// Server copies of synced state.
#[derive(Debug, Clone, Deserialize)]
pub struct PullResponse {
    #[serde(default)]
    pub exam_results: Vec<ExamResultSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExamResultSummary {
    pub result_id: String,
    pub exam_type: ExamType,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionsRequest {
    pub exam_type: ExamType,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionsResponse {
    pub success: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitExamRequest {
    pub exam_type: ExamType,
    pub subjects: Vec<String>,
    pub user_answers: HashMap<usize, String>,
    pub questions: Vec<Question>,
    pub time_taken: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitExamResponse {
    pub success: bool,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub percentage: u32,
    #[serde(default)]
    pub subject_scores: HashMap<String, SubjectScore>,
    #[serde(default)]
    pub result_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Detailed result record from `exam-results/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExamResultDetail {
    pub result_id: String,
    pub exam_type: ExamType,
    pub subjects: Vec<String>,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    #[serde(default)]
    pub subject_scores: HashMap<String, SubjectScore>,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Auth response shared by login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub status: Option<UserStatus>,
}
