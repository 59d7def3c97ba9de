//! Fix-all (§4.7): up to `maxRounds` invocations of `runLoop` with small
//! per-round budgets, stopping when nothing critical/high/medium is
//! outstanding, after `MAX_NO_PROGRESS` fruitless rounds, or on a
//! rate-limit response (60s cooldown before retry).

use camino::{Utf8Path, Utf8PathBuf};
use elon_llm::{CostLedger, Oracle};
use elon_queue::WorkQueue;
use elon_safety::PathPolicy;

use crate::progress::ProgressSink;
use crate::run_loop::{run_loop, LoopParams, LoopStopReason};

/// §4.7 default `MAX_NO_PROGRESS`.
pub const DEFAULT_MAX_NO_PROGRESS_ROUNDS: u32 = 3;
/// §4.7: "on 429 rate-limit (with 60s cooldown before retry)".
pub const RATE_LIMIT_COOLDOWN: std::time::Duration = std::time::Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct ActiveConstraintCounts {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl ActiveConstraintCounts {
    #[must_use]
    pub fn none_outstanding(&self) -> bool {
        self.critical == 0 && self.high == 0 && self.medium == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixAllStopReason {
    NothingOutstanding,
    MaxNoProgressRounds,
    MaxRoundsReached,
    StopFlag,
}

#[derive(Debug)]
pub struct FixAllResult {
    pub stop_reason: FixAllStopReason,
    pub rounds_run: u32,
    pub total_constraints_solved: u32,
}

/// A round's sleep is delegated to the caller via this trait so tests
/// never actually wait out a cooldown.
#[async_trait::async_trait]
pub trait Cooldown: Send + Sync {
    async fn sleep(&self, duration: std::time::Duration);
}

pub struct RealCooldown;

#[async_trait::async_trait]
impl Cooldown for RealCooldown {
    async fn sleep(&self, duration: std::time::Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[allow(clippy::too_many_arguments)]
pub struct FixAllParams<'a> {
    pub oracle: &'a dyn Oracle,
    pub ledger: &'a dyn CostLedger,
    pub per_round_budget_micros: u64,
    pub margin_micros: u64,
    pub estimated_oracle_cost_micros: u64,
    pub max_rounds: u32,
    pub max_constraints_per_round: u32,
    pub consecutive_dismissal_limit: u32,
    pub max_no_progress_rounds: u32,
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
    pub cooldown: &'a dyn Cooldown,
    pub active_counts: &'a dyn Fn() -> ActiveConstraintCounts,
}

pub async fn run_fix_all(params: FixAllParams<'_>) -> anyhow::Result<FixAllResult> {
    let FixAllParams {
        oracle,
        ledger,
        per_round_budget_micros,
        margin_micros,
        estimated_oracle_cost_micros,
        max_rounds,
        max_constraints_per_round,
        consecutive_dismissal_limit,
        max_no_progress_rounds,
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
        cooldown,
        active_counts,
    } = params;

    let max_no_progress = if max_no_progress_rounds == 0 {
        DEFAULT_MAX_NO_PROGRESS_ROUNDS
    } else {
        max_no_progress_rounds
    };

    let mut rounds_run = 0u32;
    let mut total_solved = 0u32;
    let mut fruitless_rounds = 0u32;

    let stop_reason = loop {
        if crate::stop_flag::stop_requested(data_dir) {
            break FixAllStopReason::StopFlag;
        }
        if (active_counts)().none_outstanding() {
            progress.info("fix-all", "no critical/high/medium constraints outstanding");
            break FixAllStopReason::NothingOutstanding;
        }
        if rounds_run >= max_rounds {
            break FixAllStopReason::MaxRoundsReached;
        }

        progress.info("fix-all", &format!("starting round {}", rounds_run + 1));

        let round_result = run_loop(LoopParams {
            oracle,
            ledger,
            budget_micros: ledger.spent().saturating_add(per_round_budget_micros),
            margin_micros,
            estimated_oracle_cost_micros,
            max_constraints: max_constraints_per_round,
            consecutive_dismissal_limit,
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

        if round_result.rate_limited {
            progress.warn("fix-all", "rate limited, cooling down", "60s");
            cooldown.sleep(RATE_LIMIT_COOLDOWN).await;
            continue;
        }

        rounds_run += 1;

        if round_result.stop_reason == LoopStopReason::StopFlag {
            break FixAllStopReason::StopFlag;
        }

        if round_result.constraints_solved == 0 {
            fruitless_rounds += 1;
        } else {
            fruitless_rounds = 0;
        }
        total_solved += round_result.constraints_solved;

        if fruitless_rounds >= max_no_progress {
            progress.warn(
                "fix-all",
                "no progress for consecutive rounds",
                &fruitless_rounds.to_string(),
            );
            break FixAllStopReason::MaxNoProgressRounds;
        }
    };

    Ok(FixAllResult {
        stop_reason,
        rounds_run,
        total_constraints_solved: total_solved,
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

    struct NoSleep;
    #[async_trait::async_trait]
    impl Cooldown for NoSleep {
        async fn sleep(&self, _duration: std::time::Duration) {}
    }

    #[tokio::test]
    async fn stops_immediately_when_nothing_outstanding() {
        let dir = TempDir::new().unwrap();
        let dd = data_dir(&dir);
        let queue = WorkQueue::new(dd.clone()).unwrap();
        let oracle = StubOracle::new(vec![]);
        let ledger = InMemoryCostLedger::new();
        let policy = policy();
        let progress = RecordingProgressSink::new();
        let cooldown = NoSleep;
        let nothing_outstanding = || ActiveConstraintCounts {
            critical: 0,
            high: 0,
            medium: 0,
            low: 0,
        };

        let result = run_fix_all(FixAllParams {
            oracle: &oracle,
            ledger: &ledger,
            per_round_budget_micros: dollars_to_micros(1.0),
            margin_micros: dollars_to_micros(0.1),
            estimated_oracle_cost_micros: dollars_to_micros(0.01),
            max_rounds: 10,
            max_constraints_per_round: 3,
            consecutive_dismissal_limit: 5,
            max_no_progress_rounds: 3,
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
            cooldown: &cooldown,
            active_counts: &nothing_outstanding,
        })
        .await
        .unwrap();

        assert_eq!(result.stop_reason, FixAllStopReason::NothingOutstanding);
        assert_eq!(result.rounds_run, 0);
    }

    #[tokio::test]
    async fn fruitless_rounds_stop_after_max_no_progress() {
        let dir = TempDir::new().unwrap();
        let dd = data_dir(&dir);
        let queue = WorkQueue::new(dd.clone()).unwrap();
        let skip_reply = serde_json::json!({"action": "skip", "reason": "nothing actionable"}).to_string();
        let oracle = StubOracle::new(vec![&skip_reply; 64]);
        let ledger = InMemoryCostLedger::new();
        let policy = policy();
        let progress = RecordingProgressSink::new();
        let cooldown = NoSleep;
        let still_outstanding = || ActiveConstraintCounts {
            critical: 1,
            high: 0,
            medium: 0,
            low: 0,
        };

        let result = run_fix_all(FixAllParams {
            oracle: &oracle,
            ledger: &ledger,
            per_round_budget_micros: dollars_to_micros(1.0),
            margin_micros: dollars_to_micros(0.1),
            estimated_oracle_cost_micros: dollars_to_micros(0.01),
            max_rounds: 10,
            max_constraints_per_round: 1,
            consecutive_dismissal_limit: 5,
            max_no_progress_rounds: 2,
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
            cooldown: &cooldown,
            active_counts: &still_outstanding,
        })
        .await
        .unwrap();

        assert_eq!(result.stop_reason, FixAllStopReason::MaxNoProgressRounds);
        assert_eq!(result.rounds_run, 2);
        assert_eq!(result.total_constraints_solved, 0);
    }
}
