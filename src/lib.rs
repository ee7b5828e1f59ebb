// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! MSH-Prep: WAEC/JAMB mock-exam practice client.
//!
//! This crate implements the client-side core of the exam practice app:
//! trial-time accounting, access gating, durable caching, and background
//! synchronization against the exam backend.

pub mod config;
pub mod device;
pub mod error;
pub mod models;
pub mod pages;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use models::user::SessionStore;
use services::{AccessGate, ExamApi, SyncAgent, TrialClock};
use store::DurableCache;

/// Shared application state.
///
/// Every component is constructed explicitly and injected here; nothing in
/// the crate reaches for a global.
pub struct AppState {
    pub config: Config,
    pub cache: DurableCache,
    pub api: ExamApi,
    pub session: SessionStore,
    pub gate: AccessGate,
    pub clock: TrialClock,
    pub sync: SyncAgent,
}
