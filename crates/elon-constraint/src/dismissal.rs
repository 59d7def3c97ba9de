//! Auto-dismissal rules (§3 invariants, §4.6 step 4): duplicate
//! near-match and auth-evidence-is-untrustworthy heuristics.

use elon_utils::similarity::jaccard_similarity;

/// §3: "A constraint whose description has Jaccard-token similarity
/// ≥ 0.6 to any past constraint description is auto-dismissed."
pub const DUPLICATE_SIMILARITY_THRESHOLD: f64 = 0.6;

/// §4.6/§8 S5: when the evidence set backing a proposed constraint is
/// mostly 401/403 against an unauthenticated crawl, it's untrustworthy.
/// "Mostly" is a strict majority, consistent with the auth quarantine
/// already excluding these from bug aggregation (§4.5) — if more than
/// half a constraint's cited evidence is auth-shaped, it's disqualified.
pub const AUTH_EVIDENCE_MAJORITY_RATIO: f64 = 0.5;

#[must_use]
pub fn is_near_duplicate(description: &str, past_descriptions: &[&str]) -> bool {
    past_descriptions
        .iter()
        .any(|past| jaccard_similarity(description, past) >= DUPLICATE_SIMILARITY_THRESHOLD)
}

/// `evidence` lines are treated as "auth-shaped" if they mention a 401 or
/// 403 status. `crawl_authenticated` short-circuits the heuristic: an
/// authenticated crawl's 401/403s are real findings, not artifacts.
#[must_use]
pub fn is_auth_related_and_untrustworthy(evidence: &[String], crawl_authenticated: bool) -> bool {
    if crawl_authenticated || evidence.is_empty() {
        return false;
    }
    let auth_shaped = evidence
        .iter()
        .filter(|line| line.contains("401") || line.contains("403"))
        .count();
    (auth_shaped as f64) / (evidence.len() as f64) > AUTH_EVIDENCE_MAJORITY_RATIO
}
