//! Shared per-invocation context: resolved paths, loaded config, the
//! compiled path policy, and the parsed identity documents every
//! command needs. Built once in `cli::run`, grounded on the teacher's
//! `CliArgs` + `Config::discover` pairing in `src/cli/run.rs`.

use camino::{Utf8Path, Utf8PathBuf};
use elon_config::Config;
use elon_constraint::ParsedGoals;
use elon_safety::{PathPolicy, PathPolicyRules};
use elon_utils::error::ElonError;

use crate::cli::args::{Cli, Commands};

pub struct Context {
    pub repo_root: Utf8PathBuf,
    pub data_dir: Utf8PathBuf,
    pub config: Config,
    pub path_policy: PathPolicy,
    pub goals: ParsedGoals,
}

impl Context {
    /// `cli`'s overrides are chained onto the builder here so they land in
    /// `source_attribution` as `ConfigSource::Cli` (§10.3's precedence),
    /// rather than being re-applied ad hoc by each command.
    pub fn build(repo_root: Utf8PathBuf, data_dir: Utf8PathBuf, cli: &Cli) -> Result<Self, ElonError> {
        std::fs::create_dir_all(&data_dir).map_err(ElonError::Io)?;

        let mut builder = elon_config::discover_builder(&data_dir).map_err(|e| ElonError::Other(anyhow::anyhow!(e)))?;
        if let Some(budget) = cli.budget {
            builder = builder.budget(budget);
        }
        match &cli.command {
            Commands::Loop { max_constraints, budget } => {
                if let Some(max_constraints) = max_constraints {
                    builder = builder.max_constraints(*max_constraints);
                }
                if let Some(budget) = budget {
                    builder = builder.continuous_budget(*budget);
                }
            }
            Commands::FixAll { max_rounds } => {
                if let Some(max_rounds) = max_rounds {
                    builder = builder.continuous_max_rounds(*max_rounds);
                }
            }
            _ => {}
        }
        let config = builder.build().map_err(|e| ElonError::Other(anyhow::anyhow!(e)))?;

        let agents_md = read_identity_file(&repo_root, "AGENTS.md");
        let rules: PathPolicyRules = elon_safety::agents_md::parse(&agents_md);
        let path_policy = PathPolicy::compile(rules).map_err(ElonError::Other)?;

        let goals_md = read_identity_file(&repo_root, "GOALS.md");
        let goals = elon_constraint::parse_goals(&goals_md);

        Ok(Self {
            repo_root,
            data_dir,
            config,
            path_policy,
            goals,
        })
    }
}

fn read_identity_file(repo_root: &Utf8Path, name: &str) -> String {
    std::fs::read_to_string(repo_root.join(name)).unwrap_or_default()
}
