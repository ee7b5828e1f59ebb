// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activation;
pub mod auth;
pub mod backend;
pub mod clock;
pub mod exam;
pub mod gate;
pub mod sync;

pub use activation::ActivationService;
pub use auth::AuthFlow;
pub use backend::ExamApi;
pub use clock::{ClockEvent, StartOutcome, TrialClock};
pub use exam::ExamService;
pub use gate::{AccessGate, Decision, DenyReason};
pub use sync::{Connectivity, SyncAgent};
