//! The Specification entity (§3 "Specification").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecAction {
    Create,
    Change,
    Verify,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeValidationSpec {
    #[serde(rename = "healthUrl")]
    pub health_url: String,
    #[serde(rename = "startCommand", skip_serializing_if = "Option::is_none")]
    pub start_command: Option<String>,
    #[serde(rename = "timeoutMs")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecSource {
    ConstraintFix,
    Build,
    ImportedSkill,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specification {
    pub id: String,
    pub file_path: String,
    pub description: String,
    pub success_criteria: Vec<String>,
    pub action: SpecAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_validation: Option<RuntimeValidationSpec>,
    pub priority: Priority,
    pub category: String,
    pub source: SpecSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_category: Option<String>,
}

impl Specification {
    /// A filename that sorts by creation time, then id — gives the
    /// deterministic FIFO-by-filename-timestamp ordering §4.3 requires.
    pub fn file_name(&self) -> String {
        format!("{}_{}.json", self.created_at.format("%Y%m%dT%H%M%S%.6fZ"), self.id)
    }
}
