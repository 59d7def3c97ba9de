//! `elon doctor` (§10.4): environment sanity check, grounded on the
//! teacher's `xchecker doctor` command.

use elon_safety::IDENTITY_FILES;
use serde_json::json;

use crate::cli::args::Cli;
use crate::context::Context;
use crate::ElonError;

struct Check {
    name: &'static str,
    ok: bool,
    detail: String,
}

pub async fn run(cli: &Cli, ctx: &Context, json_output: bool) -> Result<(), ElonError> {
    let mut checks = Vec::new();

    checks.push(check_data_dir_writable(ctx));
    checks.push(check_identity_files_present(ctx));
    checks.push(check_oracle_reachable(cli));
    checks.push(check_locks_dir_clean(ctx));

    let all_ok = checks.iter().all(|c| c.ok);

    if json_output {
        let value = json!({
            "ok": all_ok,
            "checks": checks.iter().map(|c| json!({"name": c.name, "ok": c.ok, "detail": c.detail})).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value).map_err(ElonError::Json)?);
    } else {
        for check in &checks {
            let mark = if check.ok { "✓" } else { "✗" };
            println!("{mark} {}: {}", check.name, check.detail);
        }
    }

    if all_ok {
        Ok(())
    } else {
        Err(ElonError::ValidationFailed("one or more doctor checks failed".to_string()))
    }
}

fn check_data_dir_writable(ctx: &Context) -> Check {
    let probe = ctx.data_dir.join(".doctor-write-probe");
    match std::fs::write(probe.as_std_path(), b"ok") {
        Ok(()) => {
            let _ = std::fs::remove_file(probe.as_std_path());
            Check {
                name: "data_dir_writable",
                ok: true,
                detail: format!("{} is writable", ctx.data_dir),
            }
        }
        Err(e) => Check {
            name: "data_dir_writable",
            ok: false,
            detail: format!("{} is not writable: {e}", ctx.data_dir),
        },
    }
}

fn check_identity_files_present(ctx: &Context) -> Check {
    let missing: Vec<&str> = IDENTITY_FILES
        .iter()
        .filter(|f| !ctx.repo_root.join(f).exists())
        .copied()
        .collect();
    if missing.is_empty() {
        Check {
            name: "identity_files_present",
            ok: true,
            detail: "all identity files present".to_string(),
        }
    } else {
        Check {
            name: "identity_files_present",
            ok: false,
            detail: format!("missing: {}", missing.join(", ")),
        }
    }
}

fn check_oracle_reachable(cli: &Cli) -> Check {
    match crate::oracle_factory::build_oracle(cli.model.as_deref()) {
        Err(e) => Check {
            name: "oracle_reachable",
            ok: false,
            detail: e.to_string(),
        },
        Ok(_) => Check {
            name: "oracle_reachable",
            ok: true,
            detail: "ANTHROPIC_API_KEY is set (not round-tripped to avoid spending budget)".to_string(),
        },
    }
}

fn check_locks_dir_clean(ctx: &Context) -> Check {
    let locks_dir = ctx.data_dir.join("locks");
    let stale = std::fs::read_dir(locks_dir.as_std_path())
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0);
    Check {
        name: "locks_dir",
        ok: true,
        detail: format!("{stale} lock file(s) present (advisory; not a failure on its own)"),
    }
}
