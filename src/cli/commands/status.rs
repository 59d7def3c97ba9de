//! `elon status` (§10.4): dump engine log + last evidence bundle summary.

use elon_constraint::load_engine_log;
use serde_json::json;

use crate::context::Context;
use crate::evidence_gather::load_last_crawl;
use crate::ledger::PersistedCostLedger;
use crate::ElonError;
use elon_llm::CostLedger;

pub fn run(ctx: &Context, json_output: bool) -> Result<(), ElonError> {
    let log = load_engine_log(&ctx.data_dir).map_err(ElonError::Other)?;
    let bundle = load_last_crawl(&ctx.data_dir);
    let ledger = PersistedCostLedger::load(&ctx.data_dir).map_err(ElonError::Other)?;
    let spent_usd = elon_llm::micros_to_dollars(ledger.spent());

    if json_output {
        let value = json!({
            "engineLog": &log,
            "lastEvidence": &bundle,
            "spentUsd": spent_usd,
        });
        println!("{}", serde_json::to_string_pretty(&value).map_err(ElonError::Json)?);
        return Ok(());
    }

    println!("spent: ${spent_usd:.4}");
    match &log.current {
        Some(c) => println!("active constraint: {} (score {})", c.description, c.score),
        None => println!("no active constraint"),
    }
    println!("solved: {}", log.solved.len());
    println!("history: {}", log.history.len());
    match bundle {
        Some(b) => println!("{}", elon_scheduler::summarize(&b)),
        None => println!("no evidence bundle gathered yet"),
    }

    Ok(())
}
