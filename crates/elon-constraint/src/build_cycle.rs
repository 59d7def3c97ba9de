//! Build cycle (§4.6 `runBuildCycle`): when there is no active constraint
//! and no high-severity defect, ask the oracle to propose forward-looking
//! feature specs directly, bypassing constraint identification entirely.

use elon_llm::{extract_reply, Message, Oracle, OracleError, OracleRequest, TokenUsage};
use elon_queue::{Bucket, Priority, SpecAction, SpecSource, Specification};
use elon_safety::PathPolicy;
use serde::Deserialize;

#[derive(Debug)]
pub enum BuildCycleOutcome {
    /// Oracle had nothing to propose this round.
    NoSpecs { tokens: TokenUsage },
    /// New specs ready to file into the Work Queue.
    Produced {
        specs: Vec<(Specification, Bucket)>,
        tokens: TokenUsage,
    },
    /// Transport failure never reaches a reply, so no tokens were spent;
    /// a parse failure after a successful call still spent them.
    OracleUnavailable { reason: String, tokens: TokenUsage },
}

#[derive(Debug, Deserialize)]
struct BuildReply {
    #[serde(default)]
    specs: Vec<BuildSpecReply>,
}

#[derive(Debug, Deserialize)]
struct BuildSpecReply {
    id: String,
    #[serde(rename = "filePath")]
    file_path: String,
    description: String,
    #[serde(rename = "successCriteria")]
    success_criteria: Vec<String>,
    #[serde(rename = "testCommand")]
    test_command: Option<String>,
    priority: Priority,
}

pub async fn run_build_cycle(
    oracle: &dyn Oracle,
    goals_text: &str,
    evidence_summary: &str,
    path_policy: &PathPolicy,
    timeout: std::time::Duration,
) -> BuildCycleOutcome {
    let request = OracleRequest {
        messages: vec![
            Message::system(
                "You are the build-mode oracle for an autonomous code-improvement agent. \
                 Propose forward-looking feature specs that advance the stated goals.",
            ),
            Message::user(format!(
                "GOALS:\n{goals_text}\n\nCURRENT STATE:\n{evidence_summary}\n"
            )),
        ],
        timeout,
    };

    let reply = match oracle.ask(request).await {
        Ok(reply) => reply,
        Err(OracleError::Transport(reason)) => {
            return BuildCycleOutcome::OracleUnavailable {
                reason,
                tokens: TokenUsage::default(),
            }
        }
        Err(e) => {
            return BuildCycleOutcome::OracleUnavailable {
                reason: e.to_string(),
                tokens: TokenUsage::default(),
            }
        }
    };
    let tokens = TokenUsage::from(&reply);

    let parsed: BuildReply = match extract_reply(&reply) {
        Ok(parsed) => parsed,
        Err(e) => return BuildCycleOutcome::OracleUnavailable { reason: e.to_string(), tokens },
    };

    if parsed.specs.is_empty() {
        return BuildCycleOutcome::NoSpecs { tokens };
    }

    let specs = parsed
        .specs
        .into_iter()
        .map(|s| materialize_build_spec(s, path_policy))
        .collect();

    BuildCycleOutcome::Produced { specs, tokens }
}

fn materialize_build_spec(reply: BuildSpecReply, path_policy: &PathPolicy) -> (Specification, Bucket) {
    let decision = path_policy.check(&reply.file_path);
    let bucket = if decision.safe { Bucket::Approved } else { Bucket::Pending };

    let spec = Specification {
        id: reply.id,
        file_path: reply.file_path,
        description: reply.description,
        success_criteria: reply.success_criteria,
        action: SpecAction::Create,
        test_command: reply.test_command,
        runtime_validation: None,
        priority: reply.priority,
        category: "build".to_string(),
        source: SpecSource::Build,
        constraint_id: None,
        created_at: chrono::Utc::now(),
        blocked_category: None,
    };

    (spec, bucket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elon_llm::oracle::StubOracle;
    use elon_safety::PathPolicyRules;

    fn policy() -> PathPolicy {
        PathPolicy::compile(PathPolicyRules {
            safe_paths: vec!["src/**".to_string()],
            never_touch: vec![],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn empty_specs_list_is_no_specs() {
        let oracle = StubOracle::new(vec![r#"{"specs": []}"#]);
        let outcome = run_build_cycle(&oracle, "goals", "state", &policy(), std::time::Duration::from_secs(5)).await;
        assert!(matches!(outcome, BuildCycleOutcome::NoSpecs { .. }));
    }

    #[tokio::test]
    async fn produced_specs_are_routed_by_path_safety() {
        let reply = r#"{
            "specs": [
                {
                    "id": "build-1",
                    "filePath": "src/new_feature.ts",
                    "description": "Add export button",
                    "successCriteria": ["button visible"],
                    "testCommand": null,
                    "priority": "medium"
                },
                {
                    "id": "build-2",
                    "filePath": "infra/deploy.yml",
                    "description": "Add deploy step",
                    "successCriteria": ["deploy step runs"],
                    "testCommand": null,
                    "priority": "low"
                }
            ]
        }"#;
        let oracle = StubOracle::new(vec![reply]);
        let outcome = run_build_cycle(&oracle, "goals", "state", &policy(), std::time::Duration::from_secs(5)).await;
        match outcome {
            BuildCycleOutcome::Produced { specs, .. } => {
                assert_eq!(specs.len(), 2);
                assert_eq!(specs[0].1, Bucket::Approved);
                assert_eq!(specs[1].1, Bucket::Pending);
            }
            other => panic!("expected Produced, got {other:?}"),
        }
    }
}
