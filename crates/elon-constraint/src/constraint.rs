//! The Constraint entity and Engine Log (§3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintStatus {
    Active,
    Solved,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub step: u32,
    pub file_path: String,
    pub description: String,
    pub success_criteria: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
    pub priority: elon_queue::Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub description: String,
    pub why: String,
    pub unblocks: Vec<String>,
    /// 1..10
    pub score: u8,
    pub category: String,
    pub evidence_from_crawl: Vec<String>,
    pub steps: Vec<PlanStep>,
    pub verification_pages: Vec<String>,
    pub completion_criteria: String,
    pub identified_at: chrono::DateTime<chrono::Utc>,
    pub status: ConstraintStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    Build,
    Fix,
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedAttempt {
    pub constraint: String,
    pub reason: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Single file, rewritten atomically (§3 "Engine Log").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineLog {
    pub current: Option<Constraint>,
    pub solved: Vec<Constraint>,
    pub history: Vec<Constraint>,
    pub failed_attempts: Vec<FailedAttempt>,
    pub mode_override: Option<EngineMode>,
    pub last_mode: Option<EngineMode>,
    pub last_mode_result: Option<String>,
    pub consecutive_fix_cycles: u32,
}

impl EngineLog {
    /// §3 invariant: at most one active constraint at a time.
    pub fn has_active(&self) -> bool {
        matches!(
            self.current,
            Some(Constraint {
                status: ConstraintStatus::Active,
                ..
            })
        )
    }

    pub fn blocked_descriptions(&self) -> Vec<&str> {
        self.history
            .iter()
            .filter(|c| matches!(c.status, ConstraintStatus::Dismissed))
            .map(|c| c.description.as_str())
            .collect()
    }
}
