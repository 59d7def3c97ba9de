pub mod anthropic;
pub mod cost;
pub mod oracle;

pub use anthropic::{AnthropicOracle, DEFAULT_ORACLE_TIMEOUT};
pub use cost::{dollars_to_micros, micros_to_dollars, CostLedger, InMemoryCostLedger};
pub use oracle::{Message, Oracle, OracleError, OracleReply, OracleRequest, Role, TokenUsage};

/// Extract a structured reply from raw oracle text using the
/// deterministic three-stage extractor (§9 REDESIGN FLAGS): fenced
/// `json` block, then balanced-brace scan, then raw text. Delegates to
/// `elon_utils::extraction` so every consumer of oracle replies shares
/// one parser.
pub fn extract_reply<T: serde::de::DeserializeOwned>(
    reply: &OracleReply,
) -> Result<T, elon_utils::extraction::ExtractionError> {
    elon_utils::extraction::extract_json(&reply.raw_text)
}
