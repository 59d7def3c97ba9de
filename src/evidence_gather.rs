//! Evidence Bundle assembly at the CLI boundary (§4.5): wires the
//! concrete HTTP-only crawler/scenario runner into
//! `elon_observer::EvidenceBundleBuilder`. If no `host_url` is
//! configured the crawl/health steps are skipped and the bundle reports
//! `Unhealthy` with an explanatory reason rather than guessing at one.

use camino::Utf8Path;
use elon_observer::{
    partition_auth_expected, probe_health, CrawlMode, EvidenceBundle, EvidenceBundleBuilder, HealthStatus,
    HttpCrawler, SiteCrawler,
};

const DEFAULT_MAX_PAGES: usize = 20;

pub async fn gather_evidence(_repo_root: &Utf8Path, host_url: Option<&str>, crawl_authenticated: bool) -> EvidenceBundle {
    let Some(host_url) = host_url else {
        return EvidenceBundleBuilder::default()
            .health(HealthStatus::Unhealthy {
                reason: "no host URL configured; skipping crawl".to_string(),
            })
            .build();
    };

    let health = probe_health(host_url).await;

    let crawler = HttpCrawler::new(Vec::new());
    let (issues, auth_expected, pages_visited) = match crawler.crawl(host_url, CrawlMode::Full, DEFAULT_MAX_PAGES).await {
        Ok(result) => {
            let (bugs, auth_expected) = partition_auth_expected(result.issues, crawl_authenticated);
            (bugs, auth_expected, result.pages_visited)
        }
        Err(_) => (Vec::new(), Vec::new(), 0),
    };

    EvidenceBundleBuilder::default()
        .health(health)
        .crawl_issues(issues, auth_expected, pages_visited)
        .build()
}

const LAST_CRAWL_FILE_NAME: &str = "last-crawl.json";

/// Persist the latest Evidence Bundle under `dataDir/last-crawl.json`
/// (§6 "Data directory layout"), read back by `elon status`.
pub fn persist_last_crawl(data_dir: &Utf8Path, bundle: &EvidenceBundle) -> anyhow::Result<()> {
    let path = data_dir.join(LAST_CRAWL_FILE_NAME);
    let json = serde_json::to_string_pretty(bundle)?;
    elon_utils::atomic_write::write_file_atomic(&path, &json)?;
    Ok(())
}

/// Load the latest Evidence Bundle, if any has been gathered yet.
pub fn load_last_crawl(data_dir: &Utf8Path) -> Option<EvidenceBundle> {
    let content = std::fs::read_to_string(data_dir.join(LAST_CRAWL_FILE_NAME)).ok()?;
    serde_json::from_str(&content).ok()
}
