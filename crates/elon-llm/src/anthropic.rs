//! Anthropic Messages API oracle backend.
//!
//! The actual LLM client transport is out of scope (§1: "assumed to be
//! a request/response oracle"); this is the one concrete HTTP
//! implementation of [`Oracle`] this crate ships, so there is always a
//! working transport without requiring callers to bring their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::oracle::{Message, Oracle, OracleError, OracleReply, OracleRequest, Role};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Approximate USD cost per million tokens; good enough for a
/// budget-guard heuristic, not a billing reconciliation source of truth.
const INPUT_COST_PER_MILLION_MICROS: u64 = 3_000_000;
const OUTPUT_COST_PER_MILLION_MICROS: u64 = 15_000_000;

pub struct AnthropicOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicOracle {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
            max_tokens: 4096,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_prompt = None;
        let mut converted = Vec::new();
        for msg in messages {
            match msg.role {
                Role::System => {
                    system_prompt = Some(match system_prompt {
                        Some(existing) => format!("{existing}\n\n{}", msg.content),
                        None => msg.content.clone(),
                    });
                }
                Role::User => converted.push(AnthropicMessage {
                    role: "user".to_string(),
                    content: msg.content.clone(),
                }),
            }
        }
        (system_prompt, converted)
    }
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequestBody {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponseBody {
    content: Vec<AnthropicContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[async_trait]
impl Oracle for AnthropicOracle {
    async fn ask(&self, request: OracleRequest) -> Result<OracleReply, OracleError> {
        let (system, messages) = Self::convert_messages(&request.messages);
        let body = AnthropicRequestBody {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system,
            messages,
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::TimedOut
                } else {
                    OracleError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(OracleError::InvalidCredentials);
        }
        if status == reqwest::StatusCode::PAYMENT_REQUIRED {
            return Err(OracleError::NoCredits);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(OracleError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            return Err(OracleError::Transport(format!("http status {status}")));
        }

        let parsed: AnthropicResponseBody = response
            .json()
            .await
            .map_err(|e| OracleError::Transport(format!("invalid response body: {e}")))?;

        let raw_text = parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(OracleReply {
            raw_text,
            provider: "anthropic".to_string(),
            model_used: self.model.clone(),
            tokens_input: Some(parsed.usage.input_tokens),
            tokens_output: Some(parsed.usage.output_tokens),
        })
    }

    fn cost_micros(&self, tokens_input: u64, tokens_output: u64) -> u64 {
        (tokens_input * INPUT_COST_PER_MILLION_MICROS + tokens_output * OUTPUT_COST_PER_MILLION_MICROS)
            / 1_000_000
    }
}

/// Every outbound oracle call has an explicit timeout (§9: "default
/// 3-15s depending on call"); this is the default for the Constraint
/// Engine's planning call, the most expensive / slowest one.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(15);
