//! Error taxonomy shared across the improvement loop.
//!
//! Kinds, not exception hierarchies: every cycle-level failure is one of
//! these variants so the Scheduler can decide whether to retry, abort the
//! spec, or abort the whole loop without downcasting opaque errors.

use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Top-level error returned by the improvement loop's library crates.
#[derive(Error, Debug)]
pub enum ElonError {
    #[error("safety violation: {0}")]
    SafetyViolation(String),

    #[error("identity file tampered: {file} (expected {expected}, got {actual})")]
    IdentityTampered {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("oracle refused: {0}")]
    OracleRefusal(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("transient execution error: {0}")]
    TransientExecution(String),

    #[error("spec stuck after {attempts} consecutive stuck replies: {reason}")]
    SpecStuck { attempts: u32, reason: String },

    #[error("budget exhausted: spent {spent}, budget {budget}")]
    BudgetExhausted { spent: String, budget: String },

    #[error("queue I/O error: {0}")]
    QueueIo(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ElonError {
    /// Map this error to a process exit code for the CLI boundary.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::SafetyViolation(_) | Self::IdentityTampered { .. } => ExitCode::SafetyViolation,
            Self::OracleUnavailable(_) => ExitCode::OracleUnavailable,
            Self::OracleRefusal(_) => ExitCode::Ok,
            Self::ValidationFailed(_) => ExitCode::ValidationFailed,
            Self::TransientExecution(_) => ExitCode::TransientExecution,
            Self::SpecStuck { .. } => ExitCode::SpecStuck,
            Self::BudgetExhausted { .. } => ExitCode::Ok,
            Self::QueueIo(_) | Self::Io(_) => ExitCode::QueueIo,
            Self::Json(_) => ExitCode::ValidationFailed,
            Self::Other(_) => ExitCode::Unexpected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_exhausted_is_clean_exit() {
        let err = ElonError::BudgetExhausted {
            spent: "5.00".into(),
            budget: "5.00".into(),
        };
        assert_eq!(err.to_exit_code(), ExitCode::Ok);
    }

    #[test]
    fn safety_violation_maps_to_safety_exit() {
        let err = ElonError::SafetyViolation("neverTouch match".into());
        assert_eq!(err.to_exit_code(), ExitCode::SafetyViolation);
    }
}
