use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use careers_ingest::{
    error::FetchError,
    models::job_posting::JobStatus,
    scraping::{
        adapters::{AcmeAdapter, GlobexAdapter},
        AdapterStage, PageFetcher, SiteAdapter,
    },
    services::{ingest_service::IngestService, scrape_orchestrator::ScrapeOrchestrator},
    storage::{JobStore, MemoryJobStore},
};
use tokio::sync::Notify;

const ACME_PAGE: &str = r#"
<div class="job-row" data-id="123">
    <a href="https://example.com/jobs/123"><span class="job-title">QA Engineer</span></a>
    <span class="job-location">Remote</span>
</div>
"#;

const ACME_FIVE_ONE_BROKEN: &str = r#"
<div class="job-row" data-id="1"><a href="/jobs/1"><span class="job-title">Backend Engineer</span></a></div>
<div class="job-row" data-id="2"><a href="/jobs/2"><span class="job-title">Frontend Engineer</span></a></div>
<div class="job-row"><a href="/jobs/3"><span class="job-title">Designer</span></a></div>
<div class="job-row" data-id="4"><a href="/jobs/4"><span class="job-title">Data Analyst</span></a></div>
<div class="job-row" data-id="5"><a href="/jobs/5"><span class="job-title">SRE</span></a></div>
"#;

const ACME_TWO: &str = r#"
<div class="job-row" data-id="1"><a href="/jobs/1"><span class="job-title">Backend Engineer</span></a></div>
<div class="job-row" data-id="2"><a href="/jobs/2"><span class="job-title">Frontend Engineer</span></a></div>
"#;

const ACME_TWO_SECOND_BLANK: &str = r#"
<div class="job-row" data-id="1"><a href="/jobs/1"><span class="job-title">Backend Engineer</span></a></div>
<div class="job-row" data-id="2"><a href="/jobs/2"><span class="job-title">  </span></a></div>
"#;

const GLOBEX_PAGE: &str = r#"
<table class="openings">
  <tr class="posting" data-posting-id="GX-1">
    <td><a class="posting-link" href="/careers/openings/gx-1">Support Lead</a></td>
    <td class="location">Springfield</td>
  </tr>
</table>
"#;

struct StaticPage(&'static str);

#[async_trait]
impl PageFetcher for StaticPage {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        Ok(self.0.to_string())
    }
}

struct BrokenSite;

#[async_trait]
impl PageFetcher for BrokenSite {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::Status {
            url: url.to_string(),
            status: 502,
        })
    }
}

struct PanickingSite;

#[async_trait]
impl PageFetcher for PanickingSite {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        panic!("parser blew up");
    }
}

/// Blocks inside `fetch` until the test releases it.
struct GatedPage {
    body: &'static str,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl PageFetcher for GatedPage {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.body.to_string())
    }
}

fn orchestrator(
    adapters: Vec<Arc<dyn SiteAdapter>>,
) -> (Arc<ScrapeOrchestrator>, Arc<MemoryJobStore>) {
    let store = Arc::new(MemoryJobStore::new());
    let ingest = IngestService::new(store.clone());
    (Arc::new(ScrapeOrchestrator::new(adapters, ingest)), store)
}

fn acme(fetcher: impl PageFetcher + 'static) -> Arc<dyn SiteAdapter> {
    Arc::new(AcmeAdapter::new(Arc::new(fetcher)))
}

fn globex(fetcher: impl PageFetcher + 'static) -> Arc<dyn SiteAdapter> {
    Arc::new(GlobexAdapter::new(Arc::new(fetcher)))
}

#[tokio::test]
async fn acme_cycle_stores_posting_and_rerun_refreshes_it() {
    let (orchestrator, store) = orchestrator(vec![acme(StaticPage(ACME_PAGE))]);

    let first = orchestrator.run_cycle().await;
    assert_eq!(first.cycle, 1);
    assert_eq!(first.inserted, 1);
    assert!(first.failed.is_empty());

    let posting = store.find("Acme Corp", "123").await.unwrap().unwrap();
    assert_eq!(posting.company, "Acme Corp");
    assert_eq!(posting.external_id, "123");
    assert_eq!(posting.title, "QA Engineer");
    assert!(posting.remote_flag);
    assert_eq!(posting.status, JobStatus::Open);
    assert_eq!(posting.first_seen, posting.last_seen);

    tokio::time::sleep(Duration::from_millis(10)).await;

    let second = orchestrator.run_cycle().await;
    assert_eq!(second.cycle, 2);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 1);
    assert_eq!(store.count().await.unwrap(), 1);

    let refreshed = store.find("Acme Corp", "123").await.unwrap().unwrap();
    assert_eq!(refreshed.first_seen, posting.first_seen);
    assert!(refreshed.last_seen > posting.last_seen);
}

#[tokio::test]
async fn failing_adapter_does_not_block_the_others() {
    let (orchestrator, store) =
        orchestrator(vec![acme(StaticPage(ACME_PAGE)), globex(BrokenSite)]);

    let outcome = orchestrator.run_cycle().await;

    assert_eq!(outcome.failed, vec!["Globex".to_string()]);
    assert_eq!(outcome.succeeded(), 1);
    assert_eq!(outcome.inserted, 1);
    assert!(store.find("Acme Corp", "123").await.unwrap().is_some());

    let globex_outcome = outcome
        .per_adapter
        .iter()
        .find(|o| o.company == "Globex")
        .unwrap();
    assert_eq!(globex_outcome.stage, AdapterStage::Failed);
    assert!(globex_outcome.error.as_deref().unwrap().contains("502"));
}

#[tokio::test]
async fn malformed_listing_is_counted_and_the_rest_ingested() {
    let (orchestrator, store) = orchestrator(vec![acme(StaticPage(ACME_FIVE_ONE_BROKEN))]);

    let outcome = orchestrator.run_cycle().await;

    assert_eq!(outcome.inserted, 4);
    assert_eq!(outcome.skipped_listings, 1);
    assert_eq!(store.count().await.unwrap(), 4);
}

#[tokio::test]
async fn panicking_adapter_is_reported_as_failed() {
    let (orchestrator, store) =
        orchestrator(vec![acme(PanickingSite), globex(StaticPage(GLOBEX_PAGE))]);

    let outcome = orchestrator.run_cycle().await;

    assert_eq!(outcome.failed, vec!["Acme Corp".to_string()]);
    assert!(store.find("Globex", "GX-1").await.unwrap().is_some());

    // The adapter's guard is released, so the next cycle runs it again.
    let again = orchestrator.run_cycle().await;
    assert!(again.skipped_adapters.is_empty());
}

#[tokio::test]
async fn storage_failure_only_costs_one_cycle() {
    let (orchestrator, store) = orchestrator(vec![acme(StaticPage(ACME_PAGE))]);

    store.reject_commits(true);
    let failed = orchestrator.run_cycle().await;
    assert_eq!(failed.failed, vec!["Acme Corp".to_string()]);
    assert_eq!(store.count().await.unwrap(), 0);

    store.reject_commits(false);
    let recovered = orchestrator.run_cycle().await;
    assert!(recovered.failed.is_empty());
    assert_eq!(recovered.inserted, 1);
}

#[tokio::test]
async fn overlapping_trigger_skips_busy_adapter() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let (orchestrator, store) = orchestrator(vec![acme(GatedPage {
        body: ACME_PAGE,
        entered: entered.clone(),
        release: release.clone(),
    })]);

    let slow_cycle = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.run_cycle().await })
    };
    entered.notified().await;

    let overlapping = orchestrator.run_cycle().await;
    assert_eq!(overlapping.skipped_adapters, vec!["Acme Corp".to_string()]);
    assert!(overlapping.per_adapter.is_empty());
    assert_eq!(overlapping.inserted, 0);

    release.notify_one();
    let finished = slow_cycle.await.unwrap();
    assert!(finished.failed.is_empty());
    assert_eq!(finished.inserted, 1);
    assert!(store.find("Acme Corp", "123").await.unwrap().is_some());
}

#[tokio::test]
async fn listing_that_disappears_is_closed_and_reopens_on_return() {
    let (first_run, store) = orchestrator(vec![acme(StaticPage(ACME_FIVE_ONE_BROKEN))]);
    first_run.run_cycle().await;

    let ingest = IngestService::new(store.clone());
    let shrunk = ScrapeOrchestrator::new(vec![acme(StaticPage(ACME_PAGE))], ingest.clone());
    let outcome = shrunk.run_cycle().await;
    assert_eq!(outcome.closed, 4);
    assert_eq!(
        store.find("Acme Corp", "1").await.unwrap().unwrap().status,
        JobStatus::Closed
    );

    let restored = ScrapeOrchestrator::new(vec![acme(StaticPage(ACME_FIVE_ONE_BROKEN))], ingest);
    let outcome = restored.run_cycle().await;
    assert_eq!(outcome.updated, 4);
    assert_eq!(outcome.closed, 1);
    assert_eq!(
        store.find("Acme Corp", "1").await.unwrap().unwrap().status,
        JobStatus::Open
    );
    assert_eq!(store.count().await.unwrap(), 5);
}

#[tokio::test]
async fn listing_still_on_page_but_unparseable_stays_open() {
    let (first_run, store) = orchestrator(vec![acme(StaticPage(ACME_TWO))]);
    assert_eq!(first_run.run_cycle().await.inserted, 2);

    let glitched = ScrapeOrchestrator::new(
        vec![acme(StaticPage(ACME_TWO_SECOND_BLANK))],
        IngestService::new(store.clone()),
    );
    let outcome = glitched.run_cycle().await;

    assert!(outcome.failed.is_empty());
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.skipped_listings, 1);
    assert_eq!(outcome.closed, 0);
    let kept = store.find("Acme Corp", "2").await.unwrap().unwrap();
    assert_eq!(kept.status, JobStatus::Open);
    assert_eq!(kept.title, "Frontend Engineer");
}

#[tokio::test]
async fn unparseable_salary_does_not_fail_the_adapter() {
    let page = r#"
<div class="job-row" data-id="1"><a href="/jobs/1"><span class="job-title">Backend Engineer</span></a><span class="job-salary">$79228162514264337593543950335k</span></div>
<div class="job-row" data-id="2"><a href="/jobs/2"><span class="job-title">SRE</span></a><span class="job-salary">$90k - $110k</span></div>
"#;
    let (orchestrator, store) = orchestrator(vec![acme(StaticPage(page))]);

    let outcome = orchestrator.run_cycle().await;

    assert!(outcome.failed.is_empty());
    assert_eq!(outcome.inserted, 2);
    let backend = store.find("Acme Corp", "1").await.unwrap().unwrap();
    assert_eq!(backend.salary_min, None);
    assert_eq!(backend.salary_max, None);
    assert!(store.find("Acme Corp", "2").await.unwrap().unwrap().salary_max.is_some());
}
