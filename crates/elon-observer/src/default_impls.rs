//! Minimal HTTP-only implementations of [`SiteCrawler`] and
//! [`ScenarioRunner`] (§1 non-goal: "only their interfaces are named").
//! A real headless-browser transport sees the DOM and console; these
//! see only HTTP responses, so steps that need a rendered page
//! (`WaitForSelector`, `AssertNoErrorToast`) degrade to a pass rather
//! than a verified check. Good enough to exercise the rest of the
//! pipeline without an external browser dependency.

use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::crawl::{CrawlIssue, CrawlIssueKind, CrawlMode, CrawlResult, SiteCrawler};
use crate::scenarios::{ScenarioRunner, ScenarioStep, StepResult};

const PAGE_TIMEOUT: Duration = Duration::from_secs(10);
const SLOW_RESPONSE_THRESHOLD: Duration = Duration::from_secs(3);

/// Crawls exactly `root_url` plus whatever extra same-origin paths it
/// is seeded with; there is no HTML link extraction here, so
/// `max_pages` only bounds the seed list, never discovered links.
pub struct HttpCrawler {
    client: reqwest::Client,
    extra_paths: Vec<String>,
}

impl HttpCrawler {
    #[must_use]
    pub fn new(extra_paths: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            extra_paths,
        }
    }
}

#[async_trait]
impl SiteCrawler for HttpCrawler {
    async fn crawl(&self, root_url: &str, _mode: CrawlMode, max_pages: usize) -> anyhow::Result<CrawlResult> {
        let mut pages: Vec<String> = std::iter::once(root_url.to_string())
            .chain(self.extra_paths.iter().map(|p| format!("{}{}", root_url.trim_end_matches('/'), p)))
            .collect();
        pages.truncate(max_pages.max(1));

        let mut issues = Vec::new();
        for page in &pages {
            let started = Instant::now();
            match self.client.get(page).timeout(PAGE_TIMEOUT).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        issues.push(CrawlIssue {
                            page: page.clone(),
                            kind: CrawlIssueKind::HttpError,
                            detail: format!("http status {status}"),
                            http_status: Some(status.as_u16()),
                        });
                    } else if started.elapsed() > SLOW_RESPONSE_THRESHOLD {
                        issues.push(CrawlIssue {
                            page: page.clone(),
                            kind: CrawlIssueKind::SlowResponse,
                            detail: format!("{:?}", started.elapsed()),
                            http_status: Some(status.as_u16()),
                        });
                    }
                }
                Err(e) if e.is_timeout() => issues.push(CrawlIssue {
                    page: page.clone(),
                    kind: CrawlIssueKind::NavigationError,
                    detail: "timed out".to_string(),
                    http_status: None,
                }),
                Err(e) => issues.push(CrawlIssue {
                    page: page.clone(),
                    kind: CrawlIssueKind::NetworkFailure,
                    detail: e.to_string(),
                    http_status: None,
                }),
            }
        }

        Ok(CrawlResult {
            pages_visited: pages.len(),
            issues,
        })
    }
}

/// `Navigate` and `ApiCheck` issue real requests; `WaitForSelector` and
/// `AssertNoErrorToast` need a rendered DOM this runner doesn't have,
/// so they report a pass with a note rather than a false failure.
pub struct HttpScenarioRunner {
    client: reqwest::Client,
}

impl Default for HttpScenarioRunner {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ScenarioRunner for HttpScenarioRunner {
    async fn run_step(&self, step: &ScenarioStep) -> StepResult {
        match step {
            ScenarioStep::Navigate { url } => match self.client.get(url).timeout(PAGE_TIMEOUT).send().await {
                Ok(response) if response.status().is_success() => {
                    StepResult { step_index: 0, passed: true, detail: "reachable".to_string() }
                }
                Ok(response) => StepResult {
                    step_index: 0,
                    passed: false,
                    detail: format!("http status {}", response.status()),
                },
                Err(e) => StepResult { step_index: 0, passed: false, detail: e.to_string() },
            },
            ScenarioStep::WaitForSelector { selector } => StepResult {
                step_index: 0,
                passed: true,
                detail: format!("no DOM available, assuming '{selector}' present"),
            },
            ScenarioStep::AssertNoErrorToast => StepResult {
                step_index: 0,
                passed: true,
                detail: "no DOM available, assuming no error toast".to_string(),
            },
            ScenarioStep::ApiCheck { url, expect_status } => match self.client.get(url).timeout(PAGE_TIMEOUT).send().await {
                Ok(response) if response.status().as_u16() == *expect_status => {
                    StepResult { step_index: 0, passed: true, detail: "status matched".to_string() }
                }
                Ok(response) => StepResult {
                    step_index: 0,
                    passed: false,
                    detail: format!("expected {expect_status}, got {}", response.status()),
                },
                Err(e) => StepResult { step_index: 0, passed: false, detail: e.to_string() },
            },
        }
    }
}
