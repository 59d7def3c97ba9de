//! Wire shapes for the Constraint Engine's two oracle calls (§4.6 step 3
//! and the evaluation call), and the deterministic extraction that reads
//! an oracle's free-text reply into them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LimitingFactorReply {
    Proposal {
        #[serde(rename = "limitingFactor")]
        limiting_factor: LimitingFactor,
        plan: Vec<PlanStepReply>,
        #[serde(rename = "verificationPages", default)]
        verification_pages: Vec<String>,
        #[serde(rename = "completionCriteria")]
        completion_criteria: String,
    },
    Skip {
        action: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitingFactor {
    pub description: String,
    pub why: String,
    #[serde(rename = "constraintScore")]
    pub constraint_score: u8,
    pub category: String,
    #[serde(rename = "evidenceFromCrawl", default)]
    pub evidence_from_crawl: Vec<String>,
    #[serde(default)]
    pub unblocks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanStepReply {
    pub step: u32,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub description: String,
    #[serde(rename = "successCriteria")]
    pub success_criteria: Vec<String>,
    #[serde(rename = "testCommand")]
    pub test_command: Option<String>,
    pub priority: elon_queue::Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReply {
    pub resolved: bool,
    pub reason: String,
}
