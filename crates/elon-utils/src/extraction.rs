//! Deterministic extraction of JSON from free-text oracle replies.
//!
//! §9 flags the source's "dynamic oracle output parsing" as a pattern
//! needing re-architecture: "replace layered string heuristics with one
//! deterministic extractor: first attempt fenced-JSON block, then
//! balanced-brace extraction from the first `{`, then raw. All three
//! paths feed a single JSON validator." This module is that extractor.

use serde::de::DeserializeOwned;

/// Why extraction failed, so callers can log a useful reason before
/// treating the reply as an oracle "skip" (§6, §7 `OracleUnavailable`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    NoJsonFound,
    UnbalancedBraces,
    InvalidJson(String),
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoJsonFound => write!(f, "no JSON object found in reply"),
            Self::UnbalancedBraces => write!(f, "brace-balanced extraction failed"),
            Self::InvalidJson(reason) => write!(f, "invalid JSON: {reason}"),
        }
    }
}

/// Extract and parse a JSON value of type `T` from a free-text reply.
///
/// Tries, in order: a fenced ```json code block, a balanced-brace span
/// starting at the first `{`, then the raw text itself. The first
/// candidate that parses as valid JSON wins.
pub fn extract_json<T: DeserializeOwned>(reply: &str) -> Result<T, ExtractionError> {
    let candidates = [
        extract_fenced_json_block(reply),
        extract_balanced_braces(reply),
        Some(reply.trim().to_string()),
    ];

    let mut last_err = ExtractionError::NoJsonFound;
    for candidate in candidates.into_iter().flatten() {
        match serde_json::from_str::<T>(&candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_err = ExtractionError::InvalidJson(e.to_string()),
        }
    }
    Err(last_err)
}

/// Pull the content of the first ```json ... ``` fenced block, if any.
fn extract_fenced_json_block(text: &str) -> Option<String> {
    let fence_start = text.find("```json").or_else(|| text.find("```JSON"))?;
    let after_fence = &text[fence_start..];
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim().to_string())
}

/// Extract the first balanced `{ ... }` span, correctly skipping over
/// string literals so braces inside JSON string values don't confuse the
/// depth counter.
fn extract_balanced_braces(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = start;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(text[start..=i].to_string());
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::Value;

    #[test]
    fn extracts_fenced_block() {
        let reply = "Here is my answer:\n```json\n{\"a\": 1}\n```\nThanks.";
        let v: Value = extract_json(reply).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn extracts_balanced_braces_without_fence() {
        let reply = "The result is {\"a\": {\"b\": 2}} as requested.";
        let v: Value = extract_json(reply).unwrap();
        assert_eq!(v["a"]["b"], 2);
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let reply = r#"{"description": "a { brace } inside a string", "score": 3}"#;
        let v: Value = extract_json(reply).unwrap();
        assert_eq!(v["score"], 3);
    }

    #[test]
    fn raw_json_parses_directly() {
        let reply = r#"{"action": "skip"}"#;
        #[derive(Deserialize)]
        struct Skip {
            action: String,
        }
        let v: Skip = extract_json(reply).unwrap();
        assert_eq!(v.action, "skip");
    }

    #[test]
    fn non_json_reply_fails() {
        let reply = "I don't know what to do here.";
        let result: Result<Value, _> = extract_json(reply);
        assert!(result.is_err());
    }
}
