//! Layered construction: defaults → `elon.toml` → environment → builder
//! overrides, each layer attributed in `source_attribution` (§10.3).

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::model::{Config, ConfigSource, Defaults, FileConfig};

#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    file: FileConfig,
    overrides: FileConfig,
}

macro_rules! override_setter {
    ($name:ident, $ty:ty) => {
        #[must_use]
        pub fn $name(mut self, value: $ty) -> Self {
            self.overrides.$name = Some(value);
            self
        }
    };
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an `elon.toml`-shaped layer in (lower precedence than
    /// overrides, higher than defaults).
    #[must_use]
    pub fn with_file_config(mut self, file: FileConfig) -> Self {
        self.file = file;
        self
    }

    /// Merge environment-variable-derived overrides in.
    #[must_use]
    pub fn with_env(mut self, env: FileConfig) -> Self {
        merge(&mut self.file, env);
        self
    }

    override_setter!(budget, f64);
    override_setter!(max_constraints, u32);
    override_setter!(continuous_max_rounds, u32);
    override_setter!(continuous_budget, f64);
    override_setter!(duplicate_similarity_threshold, f64);
    override_setter!(auth_evidence_majority_ratio, f64);
    override_setter!(fix_streak_before_build, u32);
    override_setter!(consecutive_dismissal_limit, u32);
    override_setter!(consecutive_stuck_limit, u32);
    override_setter!(max_iterations_per_spec, u32);
    override_setter!(max_no_progress_rounds, u32);
    override_setter!(stale_lock_age_seconds, u64);
    override_setter!(backup_retention_count, usize);
    override_setter!(budget_margin, f64);

    #[must_use]
    pub fn auto_approve_categories(mut self, categories: Vec<String>) -> Self {
        self.overrides.auto_approve_categories = Some(categories);
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let mut layer = self.file;
        merge(&mut layer, self.overrides.clone());

        let mut source_attribution = HashMap::new();
        macro_rules! resolve {
            ($field:ident, $default:expr) => {{
                let value = layer.$field.unwrap_or($default);
                let source = if self.overrides.$field.is_some() {
                    ConfigSource::Cli
                } else if layer.$field.is_some() {
                    ConfigSource::File
                } else {
                    ConfigSource::Default
                };
                source_attribution.insert(stringify!($field).to_string(), source);
                value
            }};
        }

        let config = Config {
            budget: resolve!(budget, Defaults::BUDGET),
            max_constraints: resolve!(max_constraints, Defaults::MAX_CONSTRAINTS),
            continuous_max_rounds: resolve!(continuous_max_rounds, Defaults::CONTINUOUS_MAX_ROUNDS),
            continuous_budget: resolve!(continuous_budget, Defaults::CONTINUOUS_BUDGET),
            duplicate_similarity_threshold: resolve!(
                duplicate_similarity_threshold,
                Defaults::DUPLICATE_SIMILARITY_THRESHOLD
            ),
            auth_evidence_majority_ratio: resolve!(
                auth_evidence_majority_ratio,
                Defaults::AUTH_EVIDENCE_MAJORITY_RATIO
            ),
            fix_streak_before_build: resolve!(fix_streak_before_build, Defaults::FIX_STREAK_BEFORE_BUILD),
            consecutive_dismissal_limit: resolve!(
                consecutive_dismissal_limit,
                Defaults::CONSECUTIVE_DISMISSAL_LIMIT
            ),
            consecutive_stuck_limit: resolve!(consecutive_stuck_limit, Defaults::CONSECUTIVE_STUCK_LIMIT),
            max_iterations_per_spec: resolve!(max_iterations_per_spec, Defaults::MAX_ITERATIONS_PER_SPEC),
            max_no_progress_rounds: resolve!(max_no_progress_rounds, Defaults::MAX_NO_PROGRESS_ROUNDS),
            stale_lock_age_seconds: resolve!(stale_lock_age_seconds, Defaults::STALE_LOCK_AGE_SECONDS),
            backup_retention_count: resolve!(backup_retention_count, Defaults::BACKUP_RETENTION_COUNT),
            auto_approve_categories: layer.auto_approve_categories.unwrap_or_default(),
            budget_margin: resolve!(budget_margin, Defaults::BUDGET_MARGIN),
            source_attribution,
        };

        crate::validation::validate(&config)?;
        Ok(config)
    }
}

fn merge(base: &mut FileConfig, overlay: FileConfig) {
    macro_rules! take {
        ($field:ident) => {
            if overlay.$field.is_some() {
                base.$field = overlay.$field;
            }
        };
    }
    take!(budget);
    take!(max_constraints);
    take!(continuous_max_rounds);
    take!(continuous_budget);
    take!(duplicate_similarity_threshold);
    take!(auth_evidence_majority_ratio);
    take!(fix_streak_before_build);
    take!(consecutive_dismissal_limit);
    take!(consecutive_stuck_limit);
    take!(max_iterations_per_spec);
    take!(max_no_progress_rounds);
    take!(stale_lock_age_seconds);
    take!(backup_retention_count);
    take!(auto_approve_categories);
    take!(budget_margin);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_set() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.budget, Defaults::BUDGET);
        assert_eq!(
            config.source_attribution.get("budget"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn file_layer_overrides_default() {
        let file = FileConfig {
            budget: Some(10.0),
            ..Default::default()
        };
        let config = ConfigBuilder::new().with_file_config(file).build().unwrap();
        assert_eq!(config.budget, 10.0);
        assert_eq!(config.source_attribution.get("budget"), Some(&ConfigSource::File));
    }

    #[test]
    fn builder_override_wins_over_file() {
        let file = FileConfig {
            budget: Some(10.0),
            ..Default::default()
        };
        let config = ConfigBuilder::new().with_file_config(file).budget(20.0).build().unwrap();
        assert_eq!(config.budget, 20.0);
        assert_eq!(config.source_attribution.get("budget"), Some(&ConfigSource::Cli));
    }
}
