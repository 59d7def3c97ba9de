//! Process exit codes for the `elon` CLI.
//!
//! Kept as a small enum rather than raw integers so call sites read as
//! intent ("this is a safety violation") instead of magic numbers.

/// Exit codes returned by the `elon` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok,
    SafetyViolation,
    OracleUnavailable,
    ValidationFailed,
    TransientExecution,
    SpecStuck,
    QueueIo,
    Unexpected,
}

impl ExitCode {
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::SafetyViolation => 77,
            Self::OracleUnavailable => 69,
            Self::ValidationFailed => 65,
            Self::TransientExecution => 75,
            Self::SpecStuck => 70,
            Self::QueueIo => 74,
            Self::Unexpected => 1,
        }
    }
}
