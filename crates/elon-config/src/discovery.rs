//! Environment and file discovery (§6, §10.3): `ELON_BUDGET` and friends,
//! plus an optional `elon.toml` in the data directory.

use camino::Utf8Path;

use crate::builder::ConfigBuilder;
use crate::error::ConfigError;
use crate::model::{Config, FileConfig};

/// Reads `elon.toml` from `data_dir` if present, layers environment
/// variables over it, and builds a validated [`Config`].
pub fn discover(data_dir: &Utf8Path) -> Result<Config, ConfigError> {
    discover_builder(data_dir)?.build()
}

/// Like [`discover`], but returns the builder before `.build()` so a
/// CLI layer can apply flag overrides (highest precedence) on top of
/// the file/env layers before resolving the final [`Config`].
pub fn discover_builder(data_dir: &Utf8Path) -> Result<ConfigBuilder, ConfigError> {
    let file = read_file_config(data_dir)?;
    let env = read_env_config();
    Ok(Config::builder().with_file_config(file).with_env(env))
}

fn read_file_config(data_dir: &Utf8Path) -> Result<FileConfig, ConfigError> {
    let path = data_dir.join("elon.toml");
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(e) => Err(ConfigError::ReadFailed {
            path: path.to_string(),
            source: e,
        }),
    }
}

fn read_env_config() -> FileConfig {
    FileConfig {
        budget: env_f64("ELON_BUDGET"),
        max_constraints: env_u32("ELON_MAX_CONSTRAINTS"),
        continuous_max_rounds: env_u32("ELON_CONTINUOUS_MAX_ROUNDS"),
        continuous_budget: env_f64("ELON_CONTINUOUS_BUDGET"),
        duplicate_similarity_threshold: env_f64("ELON_DUPLICATE_SIMILARITY_THRESHOLD"),
        auth_evidence_majority_ratio: env_f64("ELON_AUTH_EVIDENCE_MAJORITY_RATIO"),
        fix_streak_before_build: env_u32("ELON_FIX_STREAK_BEFORE_BUILD"),
        consecutive_dismissal_limit: env_u32("ELON_CONSECUTIVE_DISMISSAL_LIMIT"),
        consecutive_stuck_limit: env_u32("ELON_CONSECUTIVE_STUCK_LIMIT"),
        max_iterations_per_spec: env_u32("ELON_MAX_ITERATIONS_PER_SPEC"),
        max_no_progress_rounds: env_u32("ELON_MAX_NO_PROGRESS_ROUNDS"),
        stale_lock_age_seconds: std::env::var("ELON_STALE_LOCK_AGE_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok()),
        backup_retention_count: std::env::var("ELON_BACKUP_RETENTION_COUNT")
            .ok()
            .and_then(|v| v.parse().ok()),
        auto_approve_categories: std::env::var("ELON_AUTO_APPROVE_CATEGORIES")
            .ok()
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect()),
        budget_margin: env_f64("ELON_BUDGET_MARGIN"),
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn missing_elon_toml_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let config = discover(&data_dir).unwrap();
        assert_eq!(config.budget, crate::model::Defaults::BUDGET);
    }

    #[test]
    fn elon_toml_values_are_read() {
        let dir = TempDir::new().unwrap();
        let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(data_dir.join("elon.toml"), "budget = 42.0\n").unwrap();
        let config = discover(&data_dir).unwrap();
        assert_eq!(config.budget, 42.0);
    }
}
