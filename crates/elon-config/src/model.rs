//! The `Config` value and its field defaults (§6, §9 Open Questions,
//! §10.3): every threshold the Constraint Engine and Scheduler consult
//! lives here instead of as a scattered literal.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    File,
    Env,
    Cli,
}

/// `elon.toml`'s shape: numeric knobs only. Path policy and roadmap stay
/// in `AGENTS.md`/`GOALS.md` per §10.3.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    pub budget: Option<f64>,
    pub max_constraints: Option<u32>,
    pub continuous_max_rounds: Option<u32>,
    pub continuous_budget: Option<f64>,
    pub duplicate_similarity_threshold: Option<f64>,
    pub auth_evidence_majority_ratio: Option<f64>,
    pub fix_streak_before_build: Option<u32>,
    pub consecutive_dismissal_limit: Option<u32>,
    pub consecutive_stuck_limit: Option<u32>,
    pub max_iterations_per_spec: Option<u32>,
    pub max_no_progress_rounds: Option<u32>,
    pub stale_lock_age_seconds: Option<u64>,
    pub backup_retention_count: Option<usize>,
    pub auto_approve_categories: Option<Vec<String>>,
    pub budget_margin: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub budget: f64,
    pub max_constraints: u32,
    pub continuous_max_rounds: u32,
    pub continuous_budget: f64,
    pub duplicate_similarity_threshold: f64,
    pub auth_evidence_majority_ratio: f64,
    pub fix_streak_before_build: u32,
    pub consecutive_dismissal_limit: u32,
    pub consecutive_stuck_limit: u32,
    pub max_iterations_per_spec: u32,
    pub max_no_progress_rounds: u32,
    pub stale_lock_age_seconds: u64,
    pub backup_retention_count: usize,
    pub auto_approve_categories: Vec<String>,
    pub budget_margin: f64,
    pub source_attribution: HashMap<String, ConfigSource>,
}

impl Config {
    #[must_use]
    pub fn builder() -> crate::builder::ConfigBuilder {
        crate::builder::ConfigBuilder::new()
    }
}

/// §9 Open Questions / observed defaults, mirrored in
/// [`FileConfig`]'s per-field documentation.
pub struct Defaults;

impl Defaults {
    pub const BUDGET: f64 = 5.0;
    pub const MAX_CONSTRAINTS: u32 = 3;
    pub const CONTINUOUS_MAX_ROUNDS: u32 = 20;
    pub const CONTINUOUS_BUDGET: f64 = 25.0;
    pub const DUPLICATE_SIMILARITY_THRESHOLD: f64 = 0.6;
    pub const AUTH_EVIDENCE_MAJORITY_RATIO: f64 = 0.5;
    pub const FIX_STREAK_BEFORE_BUILD: u32 = 3;
    pub const CONSECUTIVE_DISMISSAL_LIMIT: u32 = 5;
    pub const CONSECUTIVE_STUCK_LIMIT: u32 = 3;
    pub const MAX_ITERATIONS_PER_SPEC: u32 = 10;
    pub const MAX_NO_PROGRESS_ROUNDS: u32 = 3;
    pub const STALE_LOCK_AGE_SECONDS: u64 = 900;
    pub const BACKUP_RETENTION_COUNT: usize = 50;
    pub const BUDGET_MARGIN: f64 = 0.25;
}
