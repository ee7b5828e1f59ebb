// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! Access denial is deliberately *not* an error: the gate returns a
//! [`Decision`](crate::services::gate::Decision) value. Errors here cover
//! the backend, storage, and validation failure classes.

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Backend API error: {0}")]
    Backend(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Marker message for a backend call attempted while offline.
    pub const OFFLINE: &'static str = "offline";

    /// True if this error came from an unreachable backend (offline mode or
    /// a transport failure), meaning the caller should fall back to cached
    /// state rather than surface a failure.
    pub fn is_offline(&self) -> bool {
        matches!(self, AppError::Backend(msg) if msg == Self::OFFLINE || msg.contains("error sending request"))
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
