//! Path safety decisions (§4.1 "Path safety", §8 property 1).
//!
//! Five ordered rules, evaluated deterministically and in finite time:
//! reject traversal, reject identity files, reject `neverTouch` matches,
//! accept `safePaths` matches, otherwise reject.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The governance-defined identity files, never mutated by this system
/// regardless of policy (§6 "Identity files").
pub const IDENTITY_FILES: &[&str] = &[
    "SOUL.md",
    "AGENTS.md",
    "GOALS.md",
    "HEARTBEAT.md",
    "IDENTITY.md",
    "USER.md",
    "TOOLS.md",
];

/// Outcome of a path-safety decision, with a human-readable reason so
/// callers can surface it in a failed-spec record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDecision {
    pub safe: bool,
    pub reason: String,
}

impl PathDecision {
    fn safe() -> Self {
        Self {
            safe: true,
            reason: "matches a safe path pattern".to_string(),
        }
    }
    fn reject(reason: impl Into<String>) -> Self {
        Self {
            safe: false,
            reason: reason.into(),
        }
    }
}

/// Raw glob lists as parsed from `AGENTS.md`, before compilation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathPolicyRules {
    pub safe_paths: Vec<String>,
    pub never_touch: Vec<String>,
}

/// Compiled policy: globs built once, reused for every decision.
pub struct PathPolicy {
    safe_paths: GlobSet,
    never_touch: GlobSet,
    rules: PathPolicyRules,
}

impl PathPolicy {
    /// Compile a policy from raw glob lists. Invalid glob syntax is
    /// rejected at construction time so bad policy fails fast rather
    /// than silently rejecting every path later.
    pub fn compile(rules: PathPolicyRules) -> anyhow::Result<Self> {
        let safe_paths = build_glob_set(&rules.safe_paths)?;
        let never_touch = build_glob_set(&rules.never_touch)?;
        Ok(Self {
            safe_paths,
            never_touch,
            rules,
        })
    }

    #[must_use]
    pub fn rules(&self) -> &PathPolicyRules {
        &self.rules
    }

    /// Decide whether `path` (repository-relative) may be mutated.
    ///
    /// Order, per §4.1:
    /// 1. parent-traversal segment → reject
    /// 2. identity file → reject
    /// 3. `neverTouch` match → reject
    /// 4. `safePaths` match → accept
    /// 5. otherwise → reject
    #[must_use]
    pub fn check(&self, path: &str) -> PathDecision {
        if contains_traversal(path) {
            return PathDecision::reject("path contains a parent-traversal segment");
        }

        if is_identity_file(path) {
            return PathDecision::reject("path is a protected identity file");
        }

        let normalized = normalize(path);
        if self.never_touch.is_match(&normalized) {
            return PathDecision::reject("path matches a neverTouch pattern");
        }

        if self.safe_paths.is_match(&normalized) {
            return PathDecision::safe();
        }

        PathDecision::reject("not in any safe pattern")
    }
}

fn build_glob_set(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

fn contains_traversal(path: &str) -> bool {
    Path::new(path)
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
        || path.split(['/', '\\']).any(|seg| seg == "..")
}

fn is_identity_file(path: &str) -> bool {
    let normalized = normalize(path);
    let basename = normalized.rsplit('/').next().unwrap_or(&normalized);
    IDENTITY_FILES.iter().any(|id| *id == basename || *id == normalized)
}
