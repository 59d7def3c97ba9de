//! Single cycle (§4.7): one call of the Constraint Engine, then
//! execution of any produced auto-approved specs, then one evaluation.

use camino::{Utf8Path, Utf8PathBuf};
use elon_constraint::{
    evaluate, load_engine_log, run_build_cycle, run_fix_cycle, save_engine_log, select_mode, BuildCycleOutcome,
    EngineMode, EvaluateOutcome, FixCycleOutcome,
};
use elon_executor::{ExecutionStatus, SpecExecutor};
use elon_llm::{CostLedger, Oracle, TokenUsage};
use elon_queue::{Bucket, WorkQueue};
use elon_safety::PathPolicy;

use crate::progress::ProgressSink;
use crate::stop_flag;

#[allow(clippy::too_many_arguments)]
pub struct SingleCycleParams<'a> {
    pub oracle: &'a dyn Oracle,
    pub ledger: &'a dyn CostLedger,
    pub budget_micros: u64,
    pub margin_micros: u64,
    pub estimated_oracle_cost_micros: u64,
    pub queue: &'a WorkQueue,
    pub data_dir: &'a Utf8Path,
    pub repo_root: Utf8PathBuf,
    pub path_policy: &'a PathPolicy,
    pub unlocked_categories: &'a [String],
    pub crawl_authenticated: bool,
    pub goals_text: &'a str,
    pub evidence_summary: &'a str,
    pub any_high_severity_defect: bool,
    pub max_iterations_per_spec: u32,
    pub oracle_timeout: std::time::Duration,
    pub progress: &'a dyn ProgressSink,
}

#[derive(Debug)]
pub enum SingleCycleOutcome {
    /// Remaining budget is below the configured margin; the cycle did
    /// not invoke the oracle at all.
    BudgetRefused,
    Ran {
        /// The constraint-engine proposal was rejected (auth-related or
        /// near-duplicate) — counts towards the consecutive-dismissal
        /// limit (§4.6 "Outer loop invariants").
        dismissed: bool,
        constraint_created: bool,
        specs_filed: usize,
        executed: Vec<(String, ExecutionStatus)>,
        evaluation: Option<EvaluateOutcome>,
        /// An oracle call in this cycle failed with a rate-limit error
        /// (§4.7 fix-all: "on 429 rate-limit, with 60s cooldown before
        /// retry").
        rate_limited: bool,
    },
}

/// `OracleError::RateLimited`'s `Display` always starts with "rate
/// limited"; every oracle-unavailable outcome threads the error's
/// `to_string()` through as its `reason`, so this is how the fix-all
/// driver recognises the condition without the Constraint Engine crate
/// re-exporting the oracle error type itself.
fn reason_is_rate_limited(reason: &str) -> bool {
    reason.contains("rate limited")
}

/// Charges `ledger` the oracle's actual cost for `tokens` (§6 "every
/// call increments a cost ledger with token counts and model
/// identifier"), rather than a flat per-call estimate.
fn charge_for_tokens(ledger: &dyn CostLedger, oracle: &dyn Oracle, tokens: TokenUsage) {
    ledger.charge(oracle.cost_micros(tokens.input, tokens.output));
}

pub async fn run_single_cycle(params: SingleCycleParams<'_>) -> anyhow::Result<SingleCycleOutcome> {
    let SingleCycleParams {
        oracle,
        ledger,
        budget_micros,
        margin_micros,
        estimated_oracle_cost_micros,
        queue,
        data_dir,
        repo_root,
        path_policy,
        unlocked_categories,
        crawl_authenticated,
        goals_text,
        evidence_summary,
        any_high_severity_defect,
        max_iterations_per_spec,
        oracle_timeout,
        progress,
    } = params;

    if elon_constraint::refuses_for_budget(ledger, budget_micros, margin_micros, estimated_oracle_cost_micros) {
        progress.warn("cycle", "budget refused", "remaining budget below configured margin");
        return Ok(SingleCycleOutcome::BudgetRefused);
    }

    let mut log = load_engine_log(data_dir)?;
    let mut dismissed = false;
    let mut constraint_created = false;
    let mut specs_filed = 0usize;
    let mut rate_limited = false;

    if log.has_active() {
        progress.info("cycle", "active constraint present, skipping fix/build");
    } else {
        let mode = select_mode(&log, any_high_severity_defect);
        match mode {
            EngineMode::Build => {
                let outcome =
                    run_build_cycle(oracle, goals_text, evidence_summary, path_policy, oracle_timeout).await;
                let produced = matches!(outcome, BuildCycleOutcome::Produced { .. });
                match outcome {
                    BuildCycleOutcome::Produced { specs, tokens } => {
                        charge_for_tokens(ledger, oracle, tokens);
                        specs_filed += file_specs(queue, specs)?;
                        progress.info("build", &format!("filed {specs_filed} build spec(s)"));
                    }
                    BuildCycleOutcome::OracleUnavailable { reason, tokens } => {
                        charge_for_tokens(ledger, oracle, tokens);
                        progress.warn("build", "oracle unavailable", &reason);
                        rate_limited |= reason_is_rate_limited(&reason);
                    }
                    BuildCycleOutcome::NoSpecs { tokens } => {
                        charge_for_tokens(ledger, oracle, tokens);
                        progress.info("build", "no unbuilt milestone proposed this round");
                    }
                }
                log.last_mode = Some(EngineMode::Build);
                log.last_mode_result = Some(if produced { "produced-specs" } else { "no-specs" }.to_string());
                log.consecutive_fix_cycles = 0;
            }
            EngineMode::Fix | EngineMode::Auto => {
                let outcome = run_fix_cycle(
                    oracle,
                    goals_text,
                    evidence_summary,
                    &log,
                    crawl_authenticated,
                    path_policy,
                    unlocked_categories,
                    oracle_timeout,
                )
                .await;
                match outcome {
                    FixCycleOutcome::Created { constraint, specs, tokens } => {
                        charge_for_tokens(ledger, oracle, tokens);
                        specs_filed += file_specs(queue, specs)?;
                        progress.info(
                            "fix",
                            &format!("new constraint '{}', {specs_filed} spec(s) filed", constraint.description),
                        );
                        log.current = Some(constraint);
                        constraint_created = true;
                    }
                    FixCycleOutcome::Dismissed { reason, tokens } => {
                        charge_for_tokens(ledger, oracle, tokens);
                        progress.warn("fix", "constraint dismissed", &reason);
                        dismissed = true;
                    }
                    FixCycleOutcome::Skipped { reason, tokens } => {
                        charge_for_tokens(ledger, oracle, tokens);
                        progress.info("fix", &format!("oracle skipped: {reason}"));
                    }
                    FixCycleOutcome::OracleUnavailable { reason, tokens } => {
                        charge_for_tokens(ledger, oracle, tokens);
                        progress.warn("fix", "oracle unavailable", &reason);
                        rate_limited |= reason_is_rate_limited(&reason);
                    }
                }
                log.last_mode = Some(EngineMode::Fix);
                log.consecutive_fix_cycles = log.consecutive_fix_cycles.saturating_add(1);
            }
        }
    }

    save_engine_log(data_dir, &log)?;

    let mut executed = Vec::new();
    for spec in queue.approved_execution_order()? {
        if stop_flag::stop_requested(data_dir) {
            progress.info("execute", "stop requested, halting spec execution");
            break;
        }
        progress.info("execute", &format!("running spec {}", spec.id));
        let executor = SpecExecutor::new(oracle, repo_root.clone(), path_policy, max_iterations_per_spec, oracle_timeout);
        let result = executor.run(&spec).await;
        let outcome_bucket = match result.status {
            ExecutionStatus::Completed => Bucket::Completed,
            ExecutionStatus::Stuck | ExecutionStatus::MaxIterations => Bucket::Failed,
        };
        queue.finish(&spec.id, outcome_bucket)?;
        progress.info("execute", &format!("spec {} finished: {:?}", spec.id, result.status));
        executed.push((spec.id, result.status));
    }

    let mut log = load_engine_log(data_dir)?;
    let evaluation = if log.has_active() {
        let outcome = evaluate(oracle, &mut log, queue, evidence_summary, oracle_timeout).await;
        save_engine_log(data_dir, &log)?;
        match &outcome {
            EvaluateOutcome::Resolved { tokens } => {
                charge_for_tokens(ledger, oracle, *tokens);
                progress.info("evaluate", "constraint resolved");
            }
            EvaluateOutcome::StillUnresolved { reason, tokens } => {
                charge_for_tokens(ledger, oracle, *tokens);
                progress.warn("evaluate", "still unresolved", reason);
            }
            EvaluateOutcome::OracleUnavailable { reason, tokens } => {
                charge_for_tokens(ledger, oracle, *tokens);
                progress.warn("evaluate", "oracle unavailable", reason);
                rate_limited |= reason_is_rate_limited(reason);
            }
            EvaluateOutcome::StillInFlight | EvaluateOutcome::NoActiveConstraint => {}
        }
        Some(outcome)
    } else {
        None
    };

    Ok(SingleCycleOutcome::Ran {
        dismissed,
        constraint_created,
        specs_filed,
        executed,
        evaluation,
        rate_limited,
    })
}

fn file_specs(queue: &WorkQueue, specs: Vec<(elon_queue::Specification, Bucket)>) -> anyhow::Result<usize> {
    let count = specs.len();
    for (spec, bucket) in specs {
        queue.file_new(&spec, bucket)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingProgressSink;
    use elon_llm::oracle::StubOracle;
    use elon_llm::{dollars_to_micros, InMemoryCostLedger};
    use elon_safety::PathPolicyRules;
    use tempfile::TempDir;

    fn policy() -> PathPolicy {
        PathPolicy::compile(PathPolicyRules {
            safe_paths: vec!["src/**".to_string()],
            never_touch: vec![],
        })
        .unwrap()
    }

    fn data_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[tokio::test]
    async fn budget_below_margin_refuses_without_calling_oracle() {
        let dir = TempDir::new().unwrap();
        let dd = data_dir(&dir);
        let queue = WorkQueue::new(dd.clone()).unwrap();
        let oracle = StubOracle::new(vec![]);
        let ledger = InMemoryCostLedger::starting_at(dollars_to_micros(4.99));
        let policy = policy();
        let progress = RecordingProgressSink::new();

        let outcome = run_single_cycle(SingleCycleParams {
            oracle: &oracle,
            ledger: &ledger,
            budget_micros: dollars_to_micros(5.0),
            margin_micros: dollars_to_micros(0.25),
            estimated_oracle_cost_micros: dollars_to_micros(0.01),
            queue: &queue,
            data_dir: &dd,
            repo_root: dd.clone(),
            path_policy: &policy,
            unlocked_categories: &[],
            crawl_authenticated: false,
            goals_text: "goals",
            evidence_summary: "evidence",
            any_high_severity_defect: false,
            max_iterations_per_spec: 5,
            oracle_timeout: std::time::Duration::from_secs(5),
            progress: &progress,
        })
        .await
        .unwrap();

        assert!(matches!(outcome, SingleCycleOutcome::BudgetRefused));
    }

    #[tokio::test]
    async fn fix_cycle_produces_constraint_and_files_approved_spec() {
        let dir = TempDir::new().unwrap();
        let dd = data_dir(&dir);
        let queue = WorkQueue::new(dd.clone()).unwrap();
        let reply = serde_json::json!({
            "limitingFactor": {
                "description": "Checkout button does nothing",
                "why": "blocks purchases",
                "constraintScore": 9,
                "category": "bugfix",
                "evidenceFromCrawl": ["console error on /checkout"],
                "unblocks": []
            },
            "plan": [{
                "step": 1,
                "filePath": "src/checkout.ts",
                "description": "wire up the submit handler",
                "successCriteria": ["clicking submit calls the API"],
                "testCommand": null,
                "priority": "high"
            }],
            "verificationPages": ["/checkout"],
            "completionCriteria": "submit calls the API"
        })
        .to_string();
        // Second reply answers the Spec Executor's call for the
        // auto-approved step filed by the first (the fix cycle's plan
        // step lands on a safe path, so it executes within this same
        // cycle per §4.7).
        let oracle = StubOracle::new(vec![&reply, "{\"action\": \"SPEC_COMPLETE\"}"]);
        let ledger = InMemoryCostLedger::new();
        let policy = policy();
        let progress = RecordingProgressSink::new();

        let outcome = run_single_cycle(SingleCycleParams {
            oracle: &oracle,
            ledger: &ledger,
            budget_micros: dollars_to_micros(5.0),
            margin_micros: dollars_to_micros(0.25),
            estimated_oracle_cost_micros: dollars_to_micros(0.01),
            queue: &queue,
            data_dir: &dd,
            repo_root: dd.clone(),
            path_policy: &policy,
            unlocked_categories: &[],
            crawl_authenticated: true,
            goals_text: "ship checkout",
            evidence_summary: "checkout console error",
            any_high_severity_defect: true,
            max_iterations_per_spec: 5,
            oracle_timeout: std::time::Duration::from_secs(5),
            progress: &progress,
        })
        .await
        .unwrap();

        match outcome {
            SingleCycleOutcome::Ran {
                constraint_created,
                specs_filed,
                dismissed,
                executed,
                ..
            } => {
                assert!(constraint_created);
                assert_eq!(specs_filed, 1);
                assert!(!dismissed);
                assert_eq!(executed.len(), 1);
                assert_eq!(executed[0].1, elon_executor::ExecutionStatus::Completed);
            }
            SingleCycleOutcome::BudgetRefused => panic!("should not refuse"),
        }

        let log = load_engine_log(&dd).unwrap();
        assert!(log.has_active());
        assert_eq!(queue.list(Bucket::Approved).unwrap().len(), 0);
        assert_eq!(queue.list(Bucket::Completed).unwrap().len(), 1);
    }
}
