//! Evidence Bundle assembly (§4.5): joins health, crawl, integration,
//! scenario, and dependency-index output into one structured record,
//! with issues severity-sorted and `info` discarded.

use serde::{Deserialize, Serialize};

use crate::crawl::{CrawlIssue, Severity};
use crate::dependency_index::DependencyIndex;
use crate::health::HealthStatus;
use crate::integrations::IntegrationCheck;
use crate::scenarios::ScenarioResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub health: HealthStatus,
    /// Severity-sorted (high, medium, low); `info` discarded.
    pub issues: Vec<CrawlIssue>,
    /// 401/403 evidence quarantined here, excluded from bug aggregation.
    pub auth_expected: Vec<CrawlIssue>,
    pub integrations: Vec<IntegrationCheck>,
    pub scenarios: Vec<ScenarioResult>,
    pub dependency_index: DependencyIndex,
    pub pages_visited: usize,
}

pub struct EvidenceBundleBuilder {
    health: Option<HealthStatus>,
    raw_issues: Vec<CrawlIssue>,
    auth_expected: Vec<CrawlIssue>,
    integrations: Vec<IntegrationCheck>,
    scenarios: Vec<ScenarioResult>,
    dependency_index: DependencyIndex,
    pages_visited: usize,
}

impl Default for EvidenceBundleBuilder {
    fn default() -> Self {
        Self {
            health: None,
            raw_issues: Vec::new(),
            auth_expected: Vec::new(),
            integrations: Vec::new(),
            scenarios: Vec::new(),
            dependency_index: DependencyIndex::default(),
            pages_visited: 0,
        }
    }
}

impl EvidenceBundleBuilder {
    pub fn health(mut self, status: HealthStatus) -> Self {
        self.health = Some(status);
        self
    }

    pub fn crawl_issues(mut self, issues: Vec<CrawlIssue>, auth_expected: Vec<CrawlIssue>, pages_visited: usize) -> Self {
        self.raw_issues = issues;
        self.auth_expected = auth_expected;
        self.pages_visited = pages_visited;
        self
    }

    pub fn integrations(mut self, checks: Vec<IntegrationCheck>) -> Self {
        self.integrations = checks;
        self
    }

    pub fn scenarios(mut self, results: Vec<ScenarioResult>) -> Self {
        self.scenarios = results;
        self
    }

    pub fn dependency_index(mut self, index: DependencyIndex) -> Self {
        self.dependency_index = index;
        self
    }

    pub fn build(self) -> EvidenceBundle {
        let mut issues: Vec<CrawlIssue> = self
            .raw_issues
            .into_iter()
            .filter(|i| i.severity() != Severity::Info)
            .collect();
        issues.sort_by(|a, b| b.severity().cmp(&a.severity()));

        EvidenceBundle {
            health: self.health.unwrap_or(HealthStatus::Unhealthy {
                reason: "not probed".to_string(),
            }),
            issues,
            auth_expected: self.auth_expected,
            integrations: self.integrations,
            scenarios: self.scenarios,
            dependency_index: self.dependency_index,
            pages_visited: self.pages_visited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::CrawlIssueKind;

    fn issue(kind: CrawlIssueKind, status: Option<u16>) -> CrawlIssue {
        CrawlIssue {
            page: "/x".to_string(),
            kind,
            detail: "d".to_string(),
            http_status: status,
        }
    }

    #[test]
    fn info_issues_are_discarded_and_rest_severity_sorted() {
        let bundle = EvidenceBundleBuilder::default()
            .health(HealthStatus::Healthy)
            .crawl_issues(
                vec![
                    issue(CrawlIssueKind::SlowResponse, None),
                    issue(CrawlIssueKind::NavigationError, None),
                    issue(CrawlIssueKind::HttpError, Some(200)),
                ],
                vec![],
                3,
            )
            .build();

        assert!(bundle.issues.iter().all(|i| i.severity() != Severity::Info));
        assert!(matches!(bundle.issues[0].kind, CrawlIssueKind::NavigationError));
    }

    #[test]
    fn auth_expected_never_appears_in_issues() {
        let auth_issue = issue(CrawlIssueKind::HttpError, Some(401));
        let bundle = EvidenceBundleBuilder::default()
            .health(HealthStatus::Healthy)
            .crawl_issues(vec![], vec![auth_issue], 1)
            .build();

        assert!(bundle.issues.is_empty());
        assert_eq!(bundle.auth_expected.len(), 1);
    }
}
