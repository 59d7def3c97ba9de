//! CLI argument definitions (§10.4): the `elon` command surface.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "elon")]
#[command(about = "Autonomous code-improvement sidecar: observe, plan, execute, verify")]
#[command(long_about = r#"
elon observes a host application, identifies its single most-limiting
defect or next unbuilt milestone via an LLM oracle, materialises a
remediation plan into a Work Queue, and executes it under strict
path-safety and budget constraints.

EXAMPLES:
  # Run one outer cycle
  elon cycle

  # Run continuously until the constraint or budget cap is hit
  elon loop --max-constraints 5 --budget 10.0

  # Drive every outstanding critical/high/medium constraint to zero
  elon fix-all --max-rounds 10

  # Inspect the Work Queue
  elon queue list --bucket pending

  # Approve a pending spec for execution
  elon queue approve a1b2c3

  # Re-pin identity checksums after an intentional AGENTS.md change
  elon identity acknowledge

  # Environment sanity check
  elon doctor

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > elon.toml > environment > defaults.
  elon.toml is read from --data-dir; AGENTS.md/GOALS.md in --repo-root remain the
  source of path policy and roadmap.
"#)]
#[command(version)]
pub struct Cli {
    /// Repository root to observe and mutate (defaults to the current directory)
    #[arg(long, global = true)]
    pub repo_root: Option<Utf8PathBuf>,

    /// Data directory for the engine log, Work Queue, and identity checksums
    /// (defaults to `<repo-root>/.elon`)
    #[arg(long, global = true)]
    pub data_dir: Option<Utf8PathBuf>,

    /// LLM model identifier override (defaults to the oracle's own default)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Host application URL probed for health/crawl evidence
    #[arg(long, global = true)]
    pub host_url: Option<String>,

    /// Per-cycle budget in USD (overrides elon.toml / ELON_BUDGET)
    #[arg(long, global = true)]
    pub budget: Option<f64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single outer cycle (one constraint/build step, execute approved specs, evaluate)
    Cycle,

    /// Run continuously: up to `--max-constraints` cycles or until the budget/dismissal limit is hit
    Loop {
        #[arg(long)]
        max_constraints: Option<u32>,
        #[arg(long)]
        budget: Option<f64>,
    },

    /// Drive every outstanding critical/high/medium constraint to zero, in rounds
    FixAll {
        #[arg(long)]
        max_rounds: Option<u32>,
    },

    /// Inspect or operate the Work Queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },

    /// Safety Kernel identity operations
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },

    /// Dump engine log + last evidence bundle summary
    Status {
        /// Emit machine-readable JSON instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Environment sanity check: data dir writable, identity files present, oracle reachable
    Doctor {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum QueueAction {
    /// List specs in a bucket (default: pending)
    List {
        #[arg(long, default_value = "pending")]
        bucket: String,
    },
    /// Move a pending spec to approved
    Approve { id: String },
    /// Move a pending spec to rejected
    Reject { id: String },
}

#[derive(Subcommand)]
pub enum IdentityAction {
    /// Re-hash identity files and compare against the pinned checksum map
    Verify,
    /// Re-pin the checksum map to the current on-disk state
    Acknowledge,
}
