//! Scheduler (§4.7): the outer driver that turns a Constraint Engine +
//! Spec Executor into single cycles, continuous loops, and fix-all runs,
//! reporting progress through a structured callback rather than driving
//! UI directly.

pub mod evidence;
pub mod fix_all;
pub mod progress;
pub mod run_loop;
pub mod single_cycle;
pub mod stop_flag;

pub use evidence::{any_high_severity_defect, summarize};
pub use fix_all::{
    run_fix_all, ActiveConstraintCounts, Cooldown, FixAllParams, FixAllResult, FixAllStopReason, RealCooldown,
    DEFAULT_MAX_NO_PROGRESS_ROUNDS, RATE_LIMIT_COOLDOWN,
};
pub use progress::{ProgressEvent, ProgressLevel, ProgressSink, RecordingProgressSink, TracingProgressSink};
pub use run_loop::{run_loop, LoopParams, LoopResult, LoopStopReason};
pub use single_cycle::{run_single_cycle, SingleCycleOutcome, SingleCycleParams};
pub use stop_flag::{clear as clear_stop_flag, stop_requested, STOP_FLAG_FILE_NAME};
