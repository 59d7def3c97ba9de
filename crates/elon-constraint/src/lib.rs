//! Constraint Engine (§4.6): the outer brain. Identifies the single
//! most-limiting defect or the next milestone, materialises a remediation
//! plan into the Work Queue, and evaluates whether prior constraints were
//! actually resolved.

mod build_cycle;
mod constraint;
mod dismissal;
mod evaluate;
mod fix_cycle;
pub mod goals;
mod invariants;
mod materialize;
mod mode;
mod oracle_protocol;
mod persistence;

pub use build_cycle::{run_build_cycle, BuildCycleOutcome};
pub use constraint::{Constraint, ConstraintStatus, EngineLog, EngineMode, FailedAttempt, PlanStep};
pub use dismissal::{
    is_auth_related_and_untrustworthy, is_near_duplicate, AUTH_EVIDENCE_MAJORITY_RATIO,
    DUPLICATE_SIMILARITY_THRESHOLD,
};
pub use goals::{parse as parse_goals, ParsedGoals};
pub use evaluate::{all_steps_terminal, evaluate, EvaluateOutcome};
pub use fix_cycle::{run_fix_cycle, FixCycleOutcome};
pub use invariants::{refuses_for_budget, DismissalStreak, DEFAULT_CONSECUTIVE_DISMISSAL_LIMIT};
pub use materialize::{matches_sensitive_category, materialize_plan};
pub use mode::select_mode;
pub use oracle_protocol::{EvaluationReply, LimitingFactor, LimitingFactorReply, PlanStepReply};
pub use persistence::{load as load_engine_log, save as save_engine_log};
