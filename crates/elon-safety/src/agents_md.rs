//! `AGENTS.md` parsing into [`PathPolicyRules`] (§3 "Identity files",
//! §4.1 "Path safety"). The governance document is plain text with two
//! flow-list lines rather than a structured format — operators edit it
//! by hand, so the parser stays forgiving about whitespace and ordering
//! rather than demanding strict YAML/TOML.
//!
//! ```text
//! safePaths: [src/**, tests/**]
//! neverTouch: [.env, secrets/**]
//! ```

use crate::path_policy::PathPolicyRules;

const SAFE_PATHS_PREFIX: &str = "safePaths:";
const NEVER_TOUCH_PREFIX: &str = "neverTouch:";

/// Parse the `safePaths`/`neverTouch` flow lists out of `AGENTS.md`
/// content. Lines that don't match either prefix are ignored, so prose
/// explaining the policy can surround the two declaration lines freely.
#[must_use]
pub fn parse(content: &str) -> PathPolicyRules {
    let mut safe_paths = Vec::new();
    let mut never_touch = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix(SAFE_PATHS_PREFIX) {
            safe_paths = parse_flow_list(rest);
        } else if let Some(rest) = trimmed.strip_prefix(NEVER_TOUCH_PREFIX) {
            never_touch = parse_flow_list(rest);
        }
    }

    PathPolicyRules { safe_paths, never_touch }
}

fn parse_flow_list(rest: &str) -> Vec<String> {
    let inner = rest.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
