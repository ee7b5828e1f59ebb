// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activation flow: local code-format validation, server redemption, and
//! the gate/clock reset that restores access.

use crate::config::ACTIVATION_CODE_PREFIX;
use crate::error::{AppError, Result};
use crate::services::backend::{ActivateRequest, ExamApi};
use crate::services::clock::TrialClock;
use crate::services::gate::AccessGate;

/// Result of an activation attempt that reached the server.
#[derive(Debug, Clone)]
pub struct ActivationOutcome {
    pub success: bool,
    pub message: String,
}

/// Check the `MSH-XXXX-XXXX` shape locally, before any network call.
///
/// The groups are uppercase alphanumerics; the prefix is literal.
pub fn validate_code_format(code: &str) -> Result<()> {
    let invalid = || {
        AppError::Validation(format!(
            "Invalid activation code format. Expected {}-XXXX-XXXX",
            ACTIVATION_CODE_PREFIX
        ))
    };

    let mut parts = code.split('-');
    let (prefix, a, b) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(p), Some(a), Some(b), None) => (p, a, b),
        _ => return Err(invalid()),
    };

    if prefix != ACTIVATION_CODE_PREFIX {
        return Err(invalid());
    }
    for group in [a, b] {
        if group.len() != 4
            || !group
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(invalid());
        }
    }

    Ok(())
}

/// Redeems activation codes and resets the trial gate on success.
#[derive(Clone)]
pub struct ActivationService {
    api: ExamApi,
    gate: AccessGate,
    clock: TrialClock,
}

impl ActivationService {
    pub fn new(api: ExamApi, gate: AccessGate, clock: TrialClock) -> Self {
        Self { api, gate, clock }
    }

    /// Attempt activation with the given code.
    ///
    /// Bad format is rejected locally with no request made and no state
    /// touched. A server-accepted code clears the expired marker and timer
    /// state and upgrades the session to activated.
    pub async fn activate(&self, code: &str) -> Result<ActivationOutcome> {
        let code = code.trim().to_uppercase();
        validate_code_format(&code)?;

        let response = self.api.activate(&ActivateRequest { code }).await?;

        if response.success {
            self.gate.reset_on_activation();
            self.clock.reset();
            tracing::info!("Account activated");
        } else {
            tracing::info!(message = %response.message, "Activation rejected by server");
        }

        Ok(ActivationOutcome {
            success: response.success,
            message: response.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_code_formats() {
        assert!(validate_code_format("MSH-KDUK-5273").is_ok());
        assert!(validate_code_format("MSH-0000-ZZZZ").is_ok());
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        assert!(validate_code_format("ABCD-1234-5678").is_err());
        assert!(validate_code_format("MSX-1234-5678").is_err());
    }

    #[test]
    fn test_malformed_groups_rejected() {
        assert!(validate_code_format("MSH-123-45678").is_err());
        assert!(validate_code_format("MSH-12a4-5678").is_err());
        assert!(validate_code_format("MSH-1234").is_err());
        assert!(validate_code_format("MSH-1234-5678-9").is_err());
        assert!(validate_code_format("").is_err());
    }
}
