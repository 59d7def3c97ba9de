//! Oracle protocol (§9): request/response abstraction over the
//! out-of-scope LLM client transport, plus deterministic reply
//! extraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub messages: Vec<Message>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleReply {
    pub raw_text: String,
    pub provider: String,
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
}

/// Token counts for one oracle call, carried alongside the cycle
/// outcomes that made the call so the caller can charge the cost
/// ledger by actual usage (§6 "every call increments a cost ledger with
/// token counts and model identifier") instead of a flat estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

impl From<&OracleReply> for TokenUsage {
    fn from(reply: &OracleReply) -> Self {
        Self {
            input: reply.tokens_input.unwrap_or(0),
            output: reply.tokens_output.unwrap_or(0),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no credits remaining")]
    NoCredits,
    #[error("request timed out")]
    TimedOut,
    #[error("rate limited, retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },
}

/// The out-of-scope LLM client transport, modelled as a
/// request/response oracle per §1. Implementations wrap a concrete HTTP
/// provider; this crate never hand-rolls one.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn ask(&self, request: OracleRequest) -> Result<OracleReply, OracleError>;

    /// Approximate USD cost (millionths precision, per §3) for a call
    /// with the given token counts, used to charge a [`crate::cost::CostLedger`].
    fn cost_micros(&self, tokens_input: u64, tokens_output: u64) -> u64;
}

/// A canned oracle for tests, in this crate and downstream ones alike
/// (enable the `test-util` feature as a dev-dependency to reach it).
#[cfg(any(test, feature = "test-util"))]
pub struct StubOracle {
    pub replies: std::sync::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-util"))]
impl StubOracle {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into_iter().map(str::to_string).rev().collect()),
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl Oracle for StubOracle {
    async fn ask(&self, _request: OracleRequest) -> Result<OracleReply, OracleError> {
        let mut replies = self.replies.lock().unwrap();
        let raw_text = replies.pop().ok_or(OracleError::Transport("exhausted stub replies".into()))?;
        Ok(OracleReply {
            raw_text,
            provider: "stub".to_string(),
            model_used: "stub-1".to_string(),
            tokens_input: Some(100),
            tokens_output: Some(50),
        })
    }

    fn cost_micros(&self, _tokens_input: u64, _tokens_output: u64) -> u64 {
        0
    }
}
