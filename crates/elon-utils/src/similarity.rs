//! Token-Jaccard similarity, used for duplicate-constraint dismissal (§3,
//! §8 property 6). Tunable threshold lives in `elon-config`; this module
//! only computes the ratio.

use std::collections::HashSet;

/// Lowercase, split on non-alphanumeric runs, dedupe into a token set.
fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the token sets of `a` and `b`, in `[0.0, 1.0]`.
/// Two empty strings are defined as similarity 0.0 (nothing to compare).
#[must_use]
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
