//! `elon fix-all` (§10.4, §4.7): drive every outstanding
//! critical/high/medium constraint to zero, in rounds.

use elon_constraint::{load_engine_log, ConstraintStatus};
use elon_llm::dollars_to_micros;
use elon_queue::WorkQueue;
use elon_scheduler::{run_fix_all, ActiveConstraintCounts, FixAllParams, RealCooldown};

use crate::cli::args::Cli;
use crate::context::Context;
use crate::ledger::PersistedCostLedger;
use crate::oracle_factory::build_oracle;
use crate::report::ReportSink;
use crate::ElonError;

const ESTIMATED_ORACLE_COST_USD: f64 = 0.05;
const PER_ROUND_BUDGET_USD: f64 = 5.0;

/// No severity field is modeled on `Constraint` itself (§3); scores are
/// 1..10, so this buckets them the way the engine's own `score(1..10)`
/// doc comment implies a high score means a severe defect.
fn severity_bucket(score: u8) -> &'static str {
    match score {
        9..=10 => "critical",
        7..=8 => "high",
        4..=6 => "medium",
        _ => "low",
    }
}

fn active_counts(ctx: &Context) -> ActiveConstraintCounts {
    let log = load_engine_log(&ctx.data_dir).unwrap_or_default();
    let mut counts = ActiveConstraintCounts {
        critical: 0,
        high: 0,
        medium: 0,
        low: 0,
    };
    let active = log.current.iter().filter(|c| c.status == ConstraintStatus::Active);
    for constraint in active {
        match severity_bucket(constraint.score) {
            "critical" => counts.critical += 1,
            "high" => counts.high += 1,
            "medium" => counts.medium += 1,
            _ => counts.low += 1,
        }
    }
    counts
}

pub async fn run(cli: &Cli, ctx: &Context) -> Result<(), ElonError> {
    let oracle = build_oracle(cli.model.as_deref())?;
    let ledger = PersistedCostLedger::load(&ctx.data_dir).map_err(ElonError::Other)?;
    let queue = WorkQueue::new(ctx.data_dir.clone()).map_err(ElonError::Other)?;
    let progress = ReportSink::new(&ctx.data_dir);
    let cooldown = RealCooldown;

    let bundle = crate::evidence_gather::gather_evidence(&ctx.repo_root, cli.host_url.as_deref(), false).await;
    let _ = crate::evidence_gather::persist_last_crawl(&ctx.data_dir, &bundle);
    let evidence_summary = elon_scheduler::summarize(&bundle);
    let any_high_severity_defect = elon_scheduler::any_high_severity_defect(&bundle);

    let margin_micros = dollars_to_micros(ctx.config.budget_margin);
    let counts_fn = || active_counts(ctx);

    let result = run_fix_all(FixAllParams {
        oracle: &oracle,
        ledger: &ledger,
        per_round_budget_micros: dollars_to_micros(PER_ROUND_BUDGET_USD),
        margin_micros,
        estimated_oracle_cost_micros: dollars_to_micros(ESTIMATED_ORACLE_COST_USD),
        max_rounds: ctx.config.continuous_max_rounds,
        max_constraints_per_round: ctx.config.max_constraints,
        consecutive_dismissal_limit: ctx.config.consecutive_dismissal_limit,
        max_no_progress_rounds: ctx.config.max_no_progress_rounds,
        queue: &queue,
        data_dir: &ctx.data_dir,
        repo_root: ctx.repo_root.clone(),
        path_policy: &ctx.path_policy,
        unlocked_categories: &ctx.config.auto_approve_categories,
        crawl_authenticated: false,
        goals_text: &ctx.goals.raw_text,
        evidence_summary: &evidence_summary,
        any_high_severity_defect,
        max_iterations_per_spec: ctx.config.max_iterations_per_spec,
        oracle_timeout: elon_llm::DEFAULT_ORACLE_TIMEOUT,
        progress: &progress,
        cooldown: &cooldown,
        active_counts: &counts_fn,
    })
    .await
    .map_err(ElonError::Other)?;

    println!("{result:?}");
    Ok(())
}
