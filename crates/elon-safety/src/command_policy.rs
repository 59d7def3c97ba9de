//! Command safety: deny-pattern-first, then allow-list (§4.1 "Command
//! safety").
//!
//! No command-execution sandbox in this pack grounds this directly, so
//! the table shape follows elon-redaction's `SecretPatternDef` idiom:
//! a flat array of compiled regexes with an id and description, checked
//! in order. Deny is authoritative — even a command matching an allow
//! prefix is rejected if any deny pattern also matches.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

struct DenyPatternDef {
    id: &'static str,
    description: &'static str,
    pattern: &'static str,
}

const DENY_PATTERN_DEFS: &[DenyPatternDef] = &[
    DenyPatternDef {
        id: "rm-rf",
        description: "recursive forced delete",
        pattern: r"\brm\s+(-\w*r\w*f\w*|-\w*f\w*r\w*)\b",
    },
    DenyPatternDef {
        id: "shell-pipe-to-interpreter",
        description: "piping remote or arbitrary content into a shell interpreter",
        pattern: r"\|\s*(sh|bash|zsh|python[0-9.]*|perl|ruby)\b",
    },
    DenyPatternDef {
        id: "privilege-escalation",
        description: "sudo or su invocation",
        pattern: r"\b(sudo|doas|su)\b",
    },
    DenyPatternDef {
        id: "destructive-sql",
        description: "destructive SQL statement",
        pattern: r"(?i)\b(drop\s+table|drop\s+database|truncate\s+table|delete\s+from\s+\w+\s*;?\s*$)\b",
    },
    DenyPatternDef {
        id: "force-push",
        description: "forced git push that can overwrite remote history",
        pattern: r"\bgit\s+push\b.*(--force\b|-f\b|--force-with-lease\b)",
    },
    DenyPatternDef {
        id: "global-install",
        description: "global package install, outside the project sandbox",
        pattern: r"\b(npm|pnpm|yarn)\s+(install|add)\b.*(-g|--global)\b|\bpip\s+install\b.*--user\b",
    },
    DenyPatternDef {
        id: "shell-chaining",
        description: "command chaining that can smuggle a second command",
        pattern: r"(&&|\|\||;)\s*\S",
    },
    DenyPatternDef {
        id: "device-write",
        description: "direct write to a block device or raw disk",
        pattern: r"\bdd\s+.*of=/dev/",
    },
];

static DENY_PATTERNS: Lazy<Vec<(&'static DenyPatternDef, Regex)>> = Lazy::new(|| {
    DENY_PATTERN_DEFS
        .iter()
        .map(|def| {
            let re = Regex::new(def.pattern).expect("deny pattern regex is valid");
            (def, re)
        })
        .collect()
});

/// Command prefixes considered safe by construction: type-checkers,
/// linters, a restricted subset of package-manager subcommands, and
/// read-only inspection tools.
const ALLOWED_PREFIXES: &[&str] = &[
    "cargo check",
    "cargo clippy",
    "cargo fmt --check",
    "cargo test",
    "cargo build",
    "tsc --noEmit",
    "eslint",
    "npm run",
    "pnpm run",
    "yarn run",
    "git status",
    "git diff",
    "git log",
    "git show",
    "ls",
    "cat",
    "grep",
    "mv",
    "cp",
];

/// For `npm run <script>` / `pnpm run <script>` / `yarn run <script>`,
/// the script name must additionally be in this set.
const SAFE_SCRIPT_NAMES: &[&str] = &["test", "lint", "typecheck", "build", "check", "format"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDecision {
    pub allowed: bool,
    pub reason: String,
}

impl CommandDecision {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }
    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Decide whether `command` may be executed. Deny patterns are checked
/// first and are authoritative; only a command clearing every deny
/// pattern is then checked against the allow-list.
#[must_use]
pub fn check_command(command: &str) -> CommandDecision {
    let trimmed = command.trim();

    for (def, re) in DENY_PATTERNS.iter() {
        if re.is_match(trimmed) {
            return CommandDecision::deny(format!("matches deny pattern '{}': {}", def.id, def.description));
        }
    }

    for prefix in ALLOWED_PREFIXES {
        if trimmed == *prefix || trimmed.starts_with(&format!("{prefix} ")) {
            if let Some(script) = extract_run_script(trimmed, prefix) {
                if !SAFE_SCRIPT_NAMES.contains(&script.as_str()) {
                    return CommandDecision::deny(format!(
                        "script '{script}' is not in the safe-script set"
                    ));
                }
            }
            return CommandDecision::allow(format!("matches allow-list prefix '{prefix}'"));
        }
    }

    CommandDecision::deny("command does not match any allow-list prefix")
}

/// For `<pm> run <rest>` prefixes, extract the first word of `<rest>` as
/// the script name to check against [`SAFE_SCRIPT_NAMES`].
fn extract_run_script(command: &str, prefix: &str) -> Option<String> {
    if !prefix.ends_with("run") {
        return None;
    }
    let remainder = command.strip_prefix(prefix)?.trim();
    remainder.split_whitespace().next().map(str::to_string)
}
