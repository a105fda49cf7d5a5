use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::{AdapterCause, AdapterError, ListingSkip};
use crate::models::job_posting::RawJobRecord;
use crate::scraping::fetcher::PageFetcher;
use crate::utils::time;

/// Where one adapter is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterStage {
    Idle,
    Fetching,
    Parsing,
    Upserting,
    Completed,
    Failed,
}

impl std::fmt::Display for AdapterStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AdapterStage::Idle => "idle",
            AdapterStage::Fetching => "fetching",
            AdapterStage::Parsing => "parsing",
            AdapterStage::Upserting => "upserting",
            AdapterStage::Completed => "completed",
            AdapterStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Records produced by one `fetch_postings` call, plus how many listing
/// elements were dropped as malformed.
#[derive(Debug, Clone, Default)]
pub struct ScrapeBatch {
    pub company: String,
    pub records: Vec<RawJobRecord>,
    pub skipped: usize,
    /// Ids of dropped listings that were still on the page.
    pub unparsed_ids: Vec<String>,
}

impl ScrapeBatch {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            ..Self::default()
        }
    }

    /// Collects one listing, counting it as skipped if it was malformed.
    /// `listing_id` is the raw id attribute of the listing element, if any.
    pub fn push(&mut self, listing_id: Option<&str>, listing: Result<RawJobRecord, ListingSkip>) {
        match listing {
            Ok(record) => self.records.push(record),
            Err(reason) => {
                debug!(company = %self.company, listing_id, %reason, "Skipping malformed listing");
                self.skipped += 1;
                if let Some(id) = listing_id.map(str::trim).filter(|id| !id.is_empty()) {
                    self.unparsed_ids.push(id.to_string());
                }
            }
        }
    }
}

/// One careers site. Adapters are stateless between calls and never write to
/// storage.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Stable company identifier, also the first half of every posting key.
    fn company(&self) -> &str;

    fn careers_url(&self) -> &str;

    fn fetcher(&self) -> &dyn PageFetcher;

    /// Turns a fetched page into records. `scraped_on` fills in `date_posted`
    /// for listings that do not state one.
    fn parse_page(&self, html: &str, scraped_on: NaiveDate) -> Result<ScrapeBatch, AdapterCause>;

    /// Fresh fetch and parse on every call.
    async fn fetch_postings(&self) -> Result<ScrapeBatch, AdapterError> {
        let company = self.company();

        debug!(company, stage = %AdapterStage::Fetching, url = self.careers_url(), "Adapter stage");
        let html = self
            .fetcher()
            .fetch(self.careers_url())
            .await
            .map_err(|e| AdapterError::new(company, e))?;

        debug!(company, stage = %AdapterStage::Parsing, bytes = html.len(), "Adapter stage");
        self.parse_page(&html, time::today())
            .map_err(|cause| AdapterError::new(company, cause))
    }
}
