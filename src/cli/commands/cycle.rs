//! `elon cycle` (§10.4): run a single outer cycle.

use elon_llm::dollars_to_micros;
use elon_queue::WorkQueue;
use elon_scheduler::{run_single_cycle, SingleCycleParams};

use crate::cli::args::Cli;
use crate::context::Context;
use crate::ledger::PersistedCostLedger;
use crate::oracle_factory::build_oracle;
use crate::report::ReportSink;
use crate::ElonError;

/// No per-call cost figure is quoted anywhere in the oracle protocol;
/// this is a conservative planning estimate used only to decide whether
/// the cycle should even attempt an oracle call against the remaining
/// budget margin (§4.7 `refusesForBudget`).
const ESTIMATED_ORACLE_COST_USD: f64 = 0.05;

pub async fn run(cli: &Cli, ctx: &Context) -> Result<(), ElonError> {
    let oracle = build_oracle(cli.model.as_deref())?;
    let ledger = PersistedCostLedger::load(&ctx.data_dir).map_err(ElonError::Other)?;
    let queue = WorkQueue::new(ctx.data_dir.clone()).map_err(ElonError::Other)?;
    let progress = ReportSink::new(&ctx.data_dir);

    let bundle = crate::evidence_gather::gather_evidence(&ctx.repo_root, cli.host_url.as_deref(), false).await;
    let _ = crate::evidence_gather::persist_last_crawl(&ctx.data_dir, &bundle);
    let evidence_summary = elon_scheduler::summarize(&bundle);
    let any_high_severity_defect = elon_scheduler::any_high_severity_defect(&bundle);

    let budget_micros = dollars_to_micros(ctx.config.budget);
    let margin_micros = dollars_to_micros(ctx.config.budget_margin);

    let outcome = run_single_cycle(SingleCycleParams {
        oracle: &oracle,
        ledger: &ledger,
        budget_micros,
        margin_micros,
        estimated_oracle_cost_micros: dollars_to_micros(ESTIMATED_ORACLE_COST_USD),
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
    })
    .await
    .map_err(ElonError::Other)?;

    println!("{outcome:?}");
    Ok(())
}
