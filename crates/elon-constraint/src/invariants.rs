//! Outer loop invariants (§4.6): the Scheduler consults these before and
//! after every Constraint Engine cycle. The "at most one oracle call in
//! flight" invariant is structural — `run_fix_cycle`/`run_build_cycle`/
//! `evaluate` each take `&dyn Oracle` and await it inline, so a caller
//! that does not spawn concurrent cycles already satisfies it.

use elon_llm::CostLedger;

/// Default `K`: a run of this many consecutive dismissals (auth-rejected
/// or duplicate) aborts the loop.
pub const DEFAULT_CONSECUTIVE_DISMISSAL_LIMIT: u32 = 5;

/// Tracks consecutive auto-dismissals across cycles of one loop run.
#[derive(Debug, Default)]
pub struct DismissalStreak {
    count: u32,
    limit: u32,
}

impl DismissalStreak {
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self { count: 0, limit }
    }

    pub fn record_dismissal(&mut self) {
        self.count += 1;
    }

    pub fn record_progress(&mut self) {
        self.count = 0;
    }

    #[must_use]
    pub fn exceeded(&self) -> bool {
        self.count >= self.limit
    }
}

/// §4.6: "the engine refuses to invoke the oracle when the remaining
/// budget is below a minimum margin." Returns `true` when a call of
/// `estimated_cost_micros` would leave `ledger` with less than
/// `margin_micros` remaining against `budget_micros`.
#[must_use]
pub fn refuses_for_budget(
    ledger: &dyn CostLedger,
    budget_micros: u64,
    margin_micros: u64,
    estimated_cost_micros: u64,
) -> bool {
    let remaining = ledger.remaining(budget_micros);
    remaining < margin_micros || remaining < estimated_cost_micros
}
