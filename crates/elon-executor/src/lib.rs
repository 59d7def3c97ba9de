//! Spec Executor (§4.4): drives one specification through at most
//! `maxIterations` iterations, dispatching oracle-proposed edits through
//! the Atomic Mutator and interpreting validation outcomes. Does not
//! itself interpret code.

pub mod oracle_protocol;

use camino::Utf8PathBuf;
use elon_llm::{extract_reply, Message, Oracle, OracleError, OracleRequest};
use elon_mutator::validation::{run_runtime_validation, run_test_command, RuntimeValidation, ValidationOutcome};
use elon_mutator::{BatchOutcome, Mutation, Mutator};
use elon_queue::Specification;
use elon_safety::PathPolicy;
use serde::{Deserialize, Serialize};

use oracle_protocol::IterationReply;

/// §4.4: "after 3 consecutive stuck replies, terminate with `stuck`."
pub const CONSECUTIVE_STUCK_LIMIT: u32 = 3;
/// §4.4 default `maxIterations`.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub action: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStatus {
    Completed,
    Stuck,
    MaxIterations,
}

#[derive(Debug)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub history: Vec<IterationRecord>,
}

pub struct SpecExecutor<'a> {
    oracle: &'a dyn Oracle,
    mutator: Mutator<'a>,
    max_iterations: u32,
    timeout: std::time::Duration,
}

impl<'a> SpecExecutor<'a> {
    pub fn new(
        oracle: &'a dyn Oracle,
        repo_root: Utf8PathBuf,
        path_policy: &'a PathPolicy,
        max_iterations: u32,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            oracle,
            mutator: Mutator::new(repo_root, path_policy),
            max_iterations,
            timeout,
        }
    }

    /// Runs the full iteration loop for `spec`, returning the terminal
    /// status and the full iteration history.
    pub async fn run(&self, spec: &Specification) -> ExecutionResult {
        let mut history: Vec<IterationRecord> = Vec::new();
        let mut consecutive_stuck: u32 = 0;

        for iteration in 1..=self.max_iterations {
            let reply = match self.call_oracle(spec, &history).await {
                Ok(reply) => reply,
                Err(reason) => {
                    history.push(IterationRecord {
                        iteration,
                        action: "oracle-call".to_string(),
                        outcome: "failed".to_string(),
                        failure_reason: Some(reason),
                    });
                    consecutive_stuck += 1;
                    if consecutive_stuck >= CONSECUTIVE_STUCK_LIMIT {
                        return ExecutionResult {
                            status: ExecutionStatus::Stuck,
                            history,
                        };
                    }
                    continue;
                }
            };

            match reply {
                IterationReply::SpecComplete => {
                    history.push(IterationRecord {
                        iteration,
                        action: "SPEC_COMPLETE".to_string(),
                        outcome: "completed".to_string(),
                        failure_reason: None,
                    });
                    return ExecutionResult {
                        status: ExecutionStatus::Completed,
                        history,
                    };
                }
                IterationReply::Stuck { reason } => {
                    consecutive_stuck += 1;
                    history.push(IterationRecord {
                        iteration,
                        action: "stuck".to_string(),
                        outcome: "stuck".to_string(),
                        failure_reason: Some(reason),
                    });
                    if consecutive_stuck >= CONSECUTIVE_STUCK_LIMIT {
                        return ExecutionResult {
                            status: ExecutionStatus::Stuck,
                            history,
                        };
                    }
                    continue;
                }
                IterationReply::DryRun { notes } => {
                    consecutive_stuck = 0;
                    history.push(IterationRecord {
                        iteration,
                        action: "dry-run".to_string(),
                        outcome: "observed".to_string(),
                        failure_reason: Some(notes),
                    });
                    continue;
                }
                other => {
                    consecutive_stuck = 0;
                    let (action_name, mutations) = Self::to_mutations(other);
                    let record = self.apply_and_validate(iteration, &action_name, mutations, spec).await;
                    history.push(record);
                    continue;
                }
            }
        }

        ExecutionResult {
            status: ExecutionStatus::MaxIterations,
            history,
        }
    }

    async fn call_oracle(
        &self,
        spec: &Specification,
        history: &[IterationRecord],
    ) -> Result<IterationReply, String> {
        let prompt = compose_iteration_task(spec, history);
        let request = OracleRequest {
            messages: vec![
                Message::system(
                    "You execute one specification at a time via small, validated file edits. \
                     Reply with exactly one action.",
                ),
                Message::user(prompt),
            ],
            timeout: self.timeout,
        };

        let reply = self.oracle.ask(request).await.map_err(|e| match e {
            OracleError::Transport(reason) => reason,
            other => other.to_string(),
        })?;

        extract_reply(&reply).map_err(|e| e.to_string())
    }

    fn to_mutations(reply: IterationReply) -> (String, Vec<Mutation>) {
        match reply {
            IterationReply::Change {
                file_path,
                old_text,
                new_text,
            } => (
                "change".to_string(),
                vec![Mutation::Change {
                    file: Utf8PathBuf::from(file_path),
                    old_text,
                    new_text,
                }],
            ),
            IterationReply::MultiChange { changes } => (
                "multi-change".to_string(),
                changes
                    .into_iter()
                    .map(|c| Mutation::Change {
                        file: Utf8PathBuf::from(c.file_path),
                        old_text: c.old_text,
                        new_text: c.new_text,
                    })
                    .collect(),
            ),
            IterationReply::Create { file_path, content } => (
                "create".to_string(),
                vec![Mutation::Create {
                    file: Utf8PathBuf::from(file_path),
                    content,
                }],
            ),
            IterationReply::MultiCreate { creates } => (
                "multi-create".to_string(),
                creates
                    .into_iter()
                    .map(|c| Mutation::Create {
                        file: Utf8PathBuf::from(c.file_path),
                        content: c.content,
                    })
                    .collect(),
            ),
            IterationReply::SpecComplete | IterationReply::Stuck { .. } | IterationReply::DryRun { .. } => {
                unreachable!("handled before to_mutations is called")
            }
        }
    }

    /// Applies `mutations` via the Atomic Mutator (syntax validation
    /// only), then runs the spec's `test_command` / `runtime_validation`
    /// against the result (§4.2 `VALIDATE (tests, runtime, syntax)`,
    /// §4.4 "every mutation is routed through the Atomic Mutator with
    /// the spec's test/runtime policy"). A failure at either stage
    /// rolls the whole batch back.
    async fn apply_and_validate(
        &self,
        iteration: u32,
        action_name: &str,
        mutations: Vec<Mutation>,
        spec: &Specification,
    ) -> IterationRecord {
        let backups = match self.mutator.apply_batch(&mutations) {
            Ok(BatchOutcome::Applied { backups }) => backups,
            Ok(BatchOutcome::RolledBack { reason, .. }) => {
                return IterationRecord {
                    iteration,
                    action: action_name.to_string(),
                    outcome: "rolled-back".to_string(),
                    failure_reason: Some(reason),
                }
            }
            Err(e) => {
                return IterationRecord {
                    iteration,
                    action: action_name.to_string(),
                    outcome: "rolled-back".to_string(),
                    failure_reason: Some(e.to_string()),
                }
            }
        };

        if let Some(reason) = self.run_validation(spec).await {
            self.mutator.rollback_batch(&backups);
            return IterationRecord {
                iteration,
                action: action_name.to_string(),
                outcome: "rolled-back".to_string(),
                failure_reason: Some(reason),
            };
        }

        IterationRecord {
            iteration,
            action: action_name.to_string(),
            outcome: "applied".to_string(),
            failure_reason: None,
        }
    }

    /// Runs `spec`'s test command and runtime validation in order,
    /// returning the failure reason of whichever fails first, or `None`
    /// if both pass (or neither is configured).
    async fn run_validation(&self, spec: &Specification) -> Option<String> {
        if let Some(test_command) = &spec.test_command {
            if let ValidationOutcome::Failed(reason) = run_test_command(test_command).await {
                return Some(reason);
            }
        }

        if let Some(runtime) = &spec.runtime_validation {
            let runtime = RuntimeValidation {
                health_url: runtime.health_url.clone(),
                start_command: runtime.start_command.clone(),
                timeout_ms: runtime.timeout_ms,
            };
            if let ValidationOutcome::Failed(reason) = run_runtime_validation(&runtime).await {
                return Some(reason);
            }
        }

        None
    }
}

fn compose_iteration_task(spec: &Specification, history: &[IterationRecord]) -> String {
    let history_text: Vec<String> = history
        .iter()
        .map(|r| {
            format!(
                "iteration {}: {} -> {}{}",
                r.iteration,
                r.action,
                r.outcome,
                r.failure_reason
                    .as_deref()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default()
            )
        })
        .collect();

    format!(
        "SPECIFICATION:\nfile: {}\ndescription: {}\nsuccess criteria: {:?}\n\nITERATION HISTORY:\n{}\n",
        spec.file_path,
        spec.description,
        spec.success_criteria,
        history_text.join("\n")
    )
}
