use crate::error::ConfigError;
use crate::model::Config;

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.budget <= 0.0 {
        return Err(ConfigError::Invalid("budget must be positive".to_string()));
    }
    if config.continuous_budget <= 0.0 {
        return Err(ConfigError::Invalid("continuous_budget must be positive".to_string()));
    }
    if !(0.0..=1.0).contains(&config.duplicate_similarity_threshold) {
        return Err(ConfigError::Invalid(
            "duplicate_similarity_threshold must be in [0, 1]".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.auth_evidence_majority_ratio) {
        return Err(ConfigError::Invalid(
            "auth_evidence_majority_ratio must be in [0, 1]".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&config.budget_margin) {
        return Err(ConfigError::Invalid("budget_margin must be in [0, 1)".to_string()));
    }
    if config.max_constraints == 0 {
        return Err(ConfigError::Invalid("max_constraints must be > 0".to_string()));
    }
    if config.consecutive_stuck_limit == 0 || config.consecutive_dismissal_limit == 0 {
        return Err(ConfigError::Invalid(
            "consecutive_stuck_limit and consecutive_dismissal_limit must be > 0".to_string(),
        ));
    }
    Ok(())
}
