//! Loop (§4.7 `runLoop`): up to `maxConstraints + K` cycles, stopping on
//! the stop flag, budget exhaustion, or a consecutive-dismissal streak.

use camino::{Utf8Path, Utf8PathBuf};
use elon_constraint::{DismissalStreak, DEFAULT_CONSECUTIVE_DISMISSAL_LIMIT};
use elon_llm::{CostLedger, Oracle};
use elon_queue::WorkQueue;
use elon_safety::PathPolicy;

use crate::progress::ProgressSink;
use crate::single_cycle::{run_single_cycle, SingleCycleOutcome, SingleCycleParams};
use crate::stop_flag;

/// §4.7: "up to `maxConstraints + K` cycles" — K extra cycles absorb
/// the execute/evaluate-only cycles that follow a constraint-creating
/// one without creating a further constraint.
const EXTRA_CYCLES_K: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStopReason {
    StopFlag,
    BudgetExhausted,
    ConsecutiveDismissalLimit,
    CycleLimitReached,
}

#[derive(Debug)]
pub struct LoopResult {
    pub stop_reason: LoopStopReason,
    pub cycles_run: u32,
    pub constraints_created: u32,
    pub constraints_solved: u32,
    /// True if any cycle in this loop hit a rate-limit response.
    pub rate_limited: bool,
}

#[allow(clippy::too_many_arguments)]
pub struct LoopParams<'a> {
    pub oracle: &'a dyn Oracle,
    pub ledger: &'a dyn CostLedger,
    pub budget_micros: u64,
    pub margin_micros: u64,
    pub estimated_oracle_cost_micros: u64,
    pub max_constraints: u32,
    pub consecutive_dismissal_limit: u32,
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

pub async fn run_loop(params: LoopParams<'_>) -> anyhow::Result<LoopResult> {
    let LoopParams {
        oracle,
        ledger,
        budget_micros,
        margin_micros,
        estimated_oracle_cost_micros,
        max_constraints,
        consecutive_dismissal_limit,
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

    let limit = if consecutive_dismissal_limit == 0 {
        DEFAULT_CONSECUTIVE_DISMISSAL_LIMIT
    } else {
        consecutive_dismissal_limit
    };
    let mut dismissal_streak = DismissalStreak::new(limit);
    let max_cycles = max_constraints.saturating_add(EXTRA_CYCLES_K);

    let mut cycles_run = 0u32;
    let mut constraints_created = 0u32;
    let mut constraints_solved = 0u32;
    let mut rate_limited = false;

    let stop_reason = loop {
        if stop_flag::stop_requested(data_dir) {
            progress.info("loop", "stop flag present, halting");
            break LoopStopReason::StopFlag;
        }
        if constraints_created >= max_constraints || cycles_run >= max_cycles {
            break LoopStopReason::CycleLimitReached;
        }
        if elon_constraint::refuses_for_budget(ledger, budget_micros, margin_micros, estimated_oracle_cost_micros) {
            progress.warn("loop", "budget exhausted", "remaining budget below margin");
            break LoopStopReason::BudgetExhausted;
        }

        let outcome = run_single_cycle(SingleCycleParams {
            oracle,
            ledger,
            budget_micros,
            margin_micros,
            estimated_oracle_cost_micros,
            queue,
            data_dir,
            repo_root: repo_root.clone(),
            path_policy,
            unlocked_categories,
            crawl_authenticated,
            goals_text,
            evidence_summary,
            any_high_severity_defect,
            max_iterations_per_spec,
            oracle_timeout,
            progress,
        })
        .await?;

        cycles_run += 1;

        match outcome {
            SingleCycleOutcome::BudgetRefused => break LoopStopReason::BudgetExhausted,
            SingleCycleOutcome::Ran {
                dismissed,
                constraint_created,
                evaluation,
                rate_limited: cycle_rate_limited,
                ..
            } => {
                rate_limited |= cycle_rate_limited;
                if dismissed {
                    dismissal_streak.record_dismissal();
                } else {
                    dismissal_streak.record_progress();
                }
                if constraint_created {
                    constraints_created += 1;
                }
                if matches!(evaluation, Some(elon_constraint::EvaluateOutcome::Resolved { .. })) {
                    constraints_solved += 1;
                }
                if dismissal_streak.exceeded() {
                    progress.warn("loop", "consecutive-dismissal limit hit", &limit.to_string());
                    break LoopStopReason::ConsecutiveDismissalLimit;
                }
            }
        }
    };

    Ok(LoopResult {
        stop_reason,
        cycles_run,
        constraints_created,
        constraints_solved,
        rate_limited,
    })
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
    async fn three_consecutive_dismissals_abort_the_loop() {
        let dir = TempDir::new().unwrap();
        let dd = data_dir(&dir);
        let queue = WorkQueue::new(dd.clone()).unwrap();
        let untrustworthy_reply = serde_json::json!({
            "limitingFactor": {
                "description": "Admin panel is unreachable",
                "why": "blocks moderation",
                "constraintScore": 7,
                "category": "bugfix",
                "evidenceFromCrawl": ["GET /admin -> 401", "GET /admin/x -> 403"],
                "unblocks": []
            },
            "plan": [],
            "verificationPages": [],
            "completionCriteria": "admin panel loads"
        })
        .to_string();
        let oracle = StubOracle::new(vec![&untrustworthy_reply; 3]);
        let ledger = InMemoryCostLedger::new();
        let policy = policy();
        let progress = RecordingProgressSink::new();

        let result = run_loop(LoopParams {
            oracle: &oracle,
            ledger: &ledger,
            budget_micros: dollars_to_micros(50.0),
            margin_micros: dollars_to_micros(0.25),
            estimated_oracle_cost_micros: dollars_to_micros(0.01),
            max_constraints: 20,
            consecutive_dismissal_limit: 3,
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

        assert_eq!(result.stop_reason, LoopStopReason::ConsecutiveDismissalLimit);
        assert_eq!(result.cycles_run, 3);
        assert_eq!(result.constraints_created, 0);
    }

    #[tokio::test]
    async fn stop_flag_halts_before_any_cycle() {
        let dir = TempDir::new().unwrap();
        let dd = data_dir(&dir);
        std::fs::write(dd.join(stop_flag::STOP_FLAG_FILE_NAME), "").unwrap();
        let queue = WorkQueue::new(dd.clone()).unwrap();
        let oracle = StubOracle::new(vec![]);
        let ledger = InMemoryCostLedger::new();
        let policy = policy();
        let progress = RecordingProgressSink::new();

        let result = run_loop(LoopParams {
            oracle: &oracle,
            ledger: &ledger,
            budget_micros: dollars_to_micros(50.0),
            margin_micros: dollars_to_micros(0.25),
            estimated_oracle_cost_micros: dollars_to_micros(0.01),
            max_constraints: 20,
            consecutive_dismissal_limit: 5,
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

        assert_eq!(result.stop_reason, LoopStopReason::StopFlag);
        assert_eq!(result.cycles_run, 0);
    }
}
