//! Site crawl (§4.5 step 2). The headless-browser transport itself is
//! explicitly out of scope (§1: "only their interfaces are named"); this
//! module defines the interface and the pre-filter/severity logic that
//! consumes whatever a concrete crawler produces.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlMode {
    Full,
    BackendOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlIssue {
    pub page: String,
    pub kind: CrawlIssueKind,
    pub detail: String,
    pub http_status: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlIssueKind {
    NavigationError,
    ConsoleError,
    NetworkFailure,
    SlowResponse,
    HttpError,
}

impl CrawlIssue {
    pub fn severity(&self) -> Severity {
        match (&self.kind, self.http_status) {
            (CrawlIssueKind::HttpError, Some(status)) if status >= 500 => Severity::High,
            (CrawlIssueKind::HttpError, Some(status)) if status >= 400 => Severity::Medium,
            (CrawlIssueKind::NavigationError, _) => Severity::High,
            (CrawlIssueKind::NetworkFailure, _) => Severity::Medium,
            (CrawlIssueKind::ConsoleError, _) => Severity::Low,
            (CrawlIssueKind::SlowResponse, _) => Severity::Low,
            _ => Severity::Info,
        }
    }

    fn is_auth_expected(&self) -> bool {
        matches!(self.http_status, Some(401) | Some(403))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlResult {
    pub pages_visited: usize,
    pub issues: Vec<CrawlIssue>,
}

/// The headless-browser transport, implemented externally (§1
/// non-goal). Accepts a starting URL, a mode, and a page budget.
#[async_trait]
pub trait SiteCrawler: Send + Sync {
    async fn crawl(&self, root_url: &str, mode: CrawlMode, max_pages: usize) -> anyhow::Result<CrawlResult>;
}

/// Drop all 401/403 responses when the crawl ran unauthenticated
/// (`backend-only` without a stored session is always unauthenticated;
/// `full` is assumed authenticated per its precondition in §4.5).
///
/// Returns `(bug_issues, auth_expected_issues)` — the latter goes into
/// the Evidence Bundle's separate `authExpected` field, never into bug
/// aggregation.
#[must_use]
pub fn partition_auth_expected(
    issues: Vec<CrawlIssue>,
    authenticated: bool,
) -> (Vec<CrawlIssue>, Vec<CrawlIssue>) {
    if authenticated {
        return (issues, Vec::new());
    }
    issues.into_iter().partition(|i| !i.is_auth_expected())
}
