//! elon - an autonomous code-improvement sidecar
//!
//! Observes a host application, identifies its single most-limiting
//! defect or next unbuilt milestone via an LLM oracle, materialises a
//! remediation plan into a Work Queue, and executes it under strict
//! path-safety and budget constraints. This crate wires the `elon-*`
//! library crates into a command-line entry point; the libraries
//! themselves hold all the actual logic.

pub mod cli;
pub mod context;
pub mod evidence_gather;
pub mod ledger;
pub mod oracle_factory;
pub mod report;

pub use elon_utils::error::ElonError;
pub use elon_utils::exit_codes::ExitCode;
