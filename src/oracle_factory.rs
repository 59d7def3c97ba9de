//! Oracle construction (§6 "Oracle protocol"): the only concrete
//! transport this crate ships is [`elon_llm::AnthropicOracle`], built
//! from `ANTHROPIC_API_KEY` plus an optional `--model` override.

use elon_llm::AnthropicOracle;
use elon_utils::error::ElonError;

const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const API_KEY_ENV_VAR: &str = "ANTHROPIC_API_KEY";

pub fn build_oracle(model: Option<&str>) -> Result<AnthropicOracle, ElonError> {
    let api_key = std::env::var(API_KEY_ENV_VAR)
        .map_err(|_| ElonError::OracleUnavailable(format!("{API_KEY_ENV_VAR} is not set")))?;
    let model = model.unwrap_or(DEFAULT_MODEL).to_string();
    Ok(AnthropicOracle::new(api_key, model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    // ANTHROPIC_API_KEY is process-global; serialize tests that touch it.
    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn missing_api_key_is_oracle_unavailable() {
        let _guard = env_lock().lock().unwrap();
        let original = std::env::var(API_KEY_ENV_VAR).ok();
        unsafe { std::env::remove_var(API_KEY_ENV_VAR) };

        let result = build_oracle(None);

        match original {
            Some(val) => unsafe { std::env::set_var(API_KEY_ENV_VAR, val) },
            None => unsafe { std::env::remove_var(API_KEY_ENV_VAR) },
        }

        assert!(matches!(result, Err(ElonError::OracleUnavailable(_))));
    }

    #[test]
    fn api_key_present_builds_oracle() {
        let _guard = env_lock().lock().unwrap();
        let original = std::env::var(API_KEY_ENV_VAR).ok();
        unsafe { std::env::set_var(API_KEY_ENV_VAR, "test-key") };

        let result = build_oracle(Some("claude-haiku"));

        match original {
            Some(val) => unsafe { std::env::set_var(API_KEY_ENV_VAR, val) },
            None => unsafe { std::env::remove_var(API_KEY_ENV_VAR) },
        }

        assert!(result.is_ok());
    }
}
