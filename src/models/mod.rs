// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod exam;
pub mod sync;
pub mod trial;
pub mod user;

pub use exam::{ExamResultRecord, ExamSession, ExamType, Question, RecentActivity};
pub use sync::{SyncBuffer, SyncCategory, SyncEntry};
pub use trial::{TickOutcome, TrialExpiredMarker, TrialTimerState};
pub use user::{SessionStore, UserSession, UserStatus};
