//! CLI entry point and dispatch logic (§10.4).
//!
//! `run()` handles all output, including errors. main.rs only maps the
//! returned [`ExitCode`] to a process exit.

use camino::Utf8PathBuf;
use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;
use crate::context::Context;
use crate::{ElonError, ExitCode};

pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    elon_utils::logging::init_tracing(cli.verbose);

    let repo_root = resolve_repo_root(&cli);
    let data_dir = resolve_data_dir(&cli, &repo_root);

    let ctx = match Context::build(repo_root, data_dir, &cli) {
        Ok(ctx) => ctx,
        Err(e) => return Err(report_and_exit(&e)),
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ failed to create async runtime: {e}");
            return Err(ExitCode::Unexpected);
        }
    };

    let result = rt.block_on(async { dispatch(&cli, &ctx).await });

    if let Err(e) = result {
        return Err(report_and_exit(&e));
    }

    Ok(())
}

async fn dispatch(cli: &Cli, ctx: &Context) -> Result<(), ElonError> {
    match &cli.command {
        Commands::Cycle => commands::cycle::run(cli, ctx).await,
        Commands::Loop { .. } => commands::loop_cmd::run(cli, ctx).await,
        Commands::FixAll { .. } => commands::fix_all::run(cli, ctx).await,
        Commands::Queue { action } => commands::queue::run(ctx, action),
        Commands::Identity { action } => commands::identity::run(ctx, action),
        Commands::Status { json } => commands::status::run(ctx, *json),
        Commands::Doctor { json } => commands::doctor::run(cli, ctx, *json).await,
    }
}

fn resolve_repo_root(cli: &Cli) -> Utf8PathBuf {
    cli.repo_root.clone().unwrap_or_else(|| {
        Utf8PathBuf::from_path_buf(std::env::current_dir().unwrap_or_default())
            .unwrap_or_else(|_| Utf8PathBuf::from("."))
    })
}

fn resolve_data_dir(cli: &Cli, repo_root: &Utf8PathBuf) -> Utf8PathBuf {
    cli.data_dir.clone().unwrap_or_else(|| repo_root.join(".elon"))
}

fn report_and_exit(error: &ElonError) -> ExitCode {
    let redactor = elon_redaction::SecretRedactor::new().ok();
    let message = error.to_string();
    let message = match &redactor {
        Some(r) => r.redact_string(&message),
        None => message,
    };
    eprintln!("✗ {message}");
    error.to_exit_code()
}
