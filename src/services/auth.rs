// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login/registration/logout orchestration.
//!
//! Authentication itself is an opaque backend call; this service turns the
//! response into a [`UserSession`], kicks off the trial clock for trial
//! users, and runs the post-login reconcile.

use crate::error::{AppError, Result};
use crate::models::user::{SessionStore, UserSession, UserStatus};
use crate::services::backend::{AuthResponse, ExamApi, LoginRequest, RegisterRequest};
use crate::services::clock::TrialClock;
use crate::services::sync::SyncAgent;

#[derive(Clone)]
pub struct AuthFlow {
    api: ExamApi,
    session: SessionStore,
    clock: TrialClock,
    sync: SyncAgent,
}

impl AuthFlow {
    pub fn new(api: ExamApi, session: SessionStore, clock: TrialClock, sync: SyncAgent) -> Self {
        Self {
            api,
            session,
            clock,
            sync,
        }
    }

    /// Log in and establish the local session.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserSession> {
        let response = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.establish(response).await
    }

    /// Register a new account and establish the local session.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserSession> {
        let response = self
            .api
            .register(&RegisterRequest {
                full_name: full_name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.establish(response).await
    }

    /// Log out: stop the clock, clear the session snapshot.
    ///
    /// The persisted trial timer stays in the cache on purpose; logging out
    /// and back in does not grant a fresh hour.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            tracing::debug!(error = %e, "Backend logout skipped");
        }
        self.clock.reset();
        self.session.clear();
        tracing::info!("Logged out");
    }

    async fn establish(&self, response: AuthResponse) -> Result<UserSession> {
        if !response.success {
            return Err(AppError::Validation(
                response
                    .message
                    .unwrap_or_else(|| "Authentication failed".to_string()),
            ));
        }

        let status = response.status.unwrap_or(UserStatus::Trial);
        let user = UserSession::new(
            response.full_name,
            response.email,
            status,
            response.is_admin,
        );
        self.session.set(user.clone());
        tracing::info!(email = %user.email, ?status, "Session established");

        if status == UserStatus::Trial {
            self.clock.start();
        }

        // Post-login reconcile; best-effort like every sync trigger
        if let Err(e) = self.sync.pull().await {
            tracing::debug!(error = %e, "Post-login reconcile skipped");
        }

        // The gate may have downgraded the snapshot during clock start
        Ok(self.session.snapshot().unwrap_or(user))
    }
}
