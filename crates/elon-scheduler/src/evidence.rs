//! Turns an Evidence Bundle into the plain-text summary the Constraint
//! Engine's oracle prompts embed (§4.6 step 2 "evidence summary"), and
//! the high-severity check §4.6 `auto` mode uses to force `fix`.

use elon_observer::{EvidenceBundle, Severity};

#[must_use]
pub fn any_high_severity_defect(bundle: &EvidenceBundle) -> bool {
    bundle.issues.iter().any(|i| i.severity() == Severity::High)
}

#[must_use]
pub fn summarize(bundle: &EvidenceBundle) -> String {
    let mut lines = Vec::new();
    lines.push(format!("health: {:?}", bundle.health));
    lines.push(format!("pages visited: {}", bundle.pages_visited));

    if bundle.issues.is_empty() {
        lines.push("no crawl issues".to_string());
    } else {
        lines.push(format!("{} crawl issue(s):", bundle.issues.len()));
        for issue in &bundle.issues {
            lines.push(format!(
                "  [{:?}] {} on {}: {}",
                issue.severity(),
                format!("{:?}", issue.kind),
                issue.page,
                issue.detail
            ));
        }
    }

    if !bundle.auth_expected.is_empty() {
        lines.push(format!(
            "{} 401/403 response(s) quarantined as auth-expected",
            bundle.auth_expected.len()
        ));
    }

    for check in &bundle.integrations {
        lines.push(format!("integration {}: {:?}", check.name, check.status));
    }

    for scenario in &bundle.scenarios {
        lines.push(format!(
            "scenario {}: {}",
            scenario.name,
            if scenario.passed { "pass" } else { "fail" }
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use elon_observer::{CrawlIssue, CrawlIssueKind, EvidenceBundleBuilder, HealthStatus};

    fn issue(kind: CrawlIssueKind, status: Option<u16>) -> CrawlIssue {
        CrawlIssue {
            page: "/p".to_string(),
            kind,
            detail: "d".to_string(),
            http_status: status,
        }
    }

    #[test]
    fn navigation_error_is_high_severity() {
        let bundle = EvidenceBundleBuilder::default()
            .health(HealthStatus::Healthy)
            .crawl_issues(vec![issue(CrawlIssueKind::NavigationError, None)], vec![], 1)
            .build();
        assert!(any_high_severity_defect(&bundle));
    }

    #[test]
    fn no_issues_means_no_high_severity_defect() {
        let bundle = EvidenceBundleBuilder::default()
            .health(HealthStatus::Healthy)
            .crawl_issues(vec![], vec![], 1)
            .build();
        assert!(!any_high_severity_defect(&bundle));
        assert!(summarize(&bundle).contains("no crawl issues"));
    }
}
