pub mod crawl;
pub mod default_impls;
pub mod dependency_index;
pub mod evidence;
pub mod health;
pub mod integrations;
pub mod scenarios;

pub use crawl::{partition_auth_expected, CrawlIssue, CrawlIssueKind, CrawlMode, CrawlResult, Severity, SiteCrawler};
pub use default_impls::{HttpCrawler, HttpScenarioRunner};
pub use dependency_index::{build_index, DependencyIndex, SourceKind};
pub use evidence::{EvidenceBundle, EvidenceBundleBuilder};
pub use health::{probe_health, HealthStatus};
pub use integrations::{check_integration, IntegrationCheck, IntegrationSpec, IntegrationStatus};
pub use scenarios::{run_scenario, Scenario, ScenarioResult, ScenarioRunner, ScenarioStep, StepResult};
