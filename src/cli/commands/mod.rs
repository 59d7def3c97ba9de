//! Command implementations, one module per `elon` subcommand.

pub mod cycle;
pub mod doctor;
pub mod fix_all;
pub mod identity;
pub mod loop_cmd;
pub mod queue;
pub mod status;
