//! `GOALS.md` parsing (§3 "Identity files"): an optional `mode:` pin
//! and a markdown-checkbox roadmap, on top of the raw text every oracle
//! prompt embeds verbatim.

use crate::constraint::EngineMode;

const MODE_PREFIX: &str = "mode:";

#[derive(Debug, Clone, Default)]
pub struct ParsedGoals {
    /// Explicit `mode: fix` / `mode: build` pin, if the operator set one.
    pub mode_override: Option<EngineMode>,
    /// Unchecked `- [ ]` roadmap items, in document order.
    pub open_roadmap_items: Vec<String>,
    /// The full document, embedded verbatim in oracle prompts.
    pub raw_text: String,
}

#[must_use]
pub fn parse(content: &str) -> ParsedGoals {
    let mut mode_override = None;
    let mut open_roadmap_items = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix(MODE_PREFIX) {
            mode_override = match rest.trim().to_lowercase().as_str() {
                "fix" => Some(EngineMode::Fix),
                "build" => Some(EngineMode::Build),
                "auto" => Some(EngineMode::Auto),
                _ => None,
            };
        } else if let Some(item) = trimmed.strip_prefix("- [ ]") {
            open_roadmap_items.push(item.trim().to_string());
        }
    }

    ParsedGoals {
        mode_override,
        open_roadmap_items,
        raw_text: content.to_string(),
    }
}
