use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AdapterCause, ListingSkip};
use crate::models::job_posting::RawJobRecord;
use crate::scraping::adapter::{ScrapeBatch, SiteAdapter};
use crate::scraping::extract::{first_attr, first_text, mentions_remote, resolve_href, selector, text_of};
use crate::scraping::fetcher::PageFetcher;
use crate::utils::salary::parse_salary_range;

/// Acme lists every opening as a flat `.job-row` div keyed by `data-id`.
pub struct AcmeAdapter {
    fetcher: Arc<dyn PageFetcher>,
    careers_url: String,
}

impl AcmeAdapter {
    pub const COMPANY: &'static str = "Acme Corp";
    pub const CAREERS_URL: &'static str = "https://example.com/careers";

    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_url(fetcher, Self::CAREERS_URL)
    }

    pub fn with_url(fetcher: Arc<dyn PageFetcher>, careers_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            careers_url: careers_url.into(),
        }
    }
}

struct RowSelectors {
    row: Selector,
    title: Selector,
    link: Selector,
    location: Selector,
    salary: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self, AdapterCause> {
        Ok(Self {
            row: selector(".job-row")?,
            title: selector(".job-title")?,
            link: selector("a[href]")?,
            location: selector(".job-location")?,
            salary: selector(".job-salary")?,
        })
    }
}

#[async_trait]
impl SiteAdapter for AcmeAdapter {
    fn company(&self) -> &str {
        Self::COMPANY
    }

    fn careers_url(&self) -> &str {
        &self.careers_url
    }

    fn fetcher(&self) -> &dyn PageFetcher {
        self.fetcher.as_ref()
    }

    fn parse_page(&self, html: &str, scraped_on: NaiveDate) -> Result<ScrapeBatch, AdapterCause> {
        let selectors = RowSelectors::new()?;
        let document = Html::parse_document(html);

        let mut batch = ScrapeBatch::new(Self::COMPANY);
        for row in document.select(&selectors.row) {
            batch.push(row.value().attr("data-id"), self.parse_row(row, &selectors, scraped_on));
        }
        Ok(batch)
    }
}

impl AcmeAdapter {
    fn parse_row(
        &self,
        row: ElementRef<'_>,
        selectors: &RowSelectors,
        scraped_on: NaiveDate,
    ) -> Result<RawJobRecord, ListingSkip> {
        let external_id = row
            .value()
            .attr("data-id")
            .ok_or(ListingSkip::MissingField("external_id"))?;
        let title = first_text(row, &selectors.title).ok_or(ListingSkip::MissingField("title"))?;
        let href = first_attr(row, &selectors.link, "href").ok_or(ListingSkip::MissingField("url"))?;
        let url = resolve_href(&self.careers_url, href).ok_or(ListingSkip::MissingField("url"))?;

        let location = first_text(row, &selectors.location);
        let salary = first_text(row, &selectors.salary)
            .and_then(|text| parse_salary_range(&text))
            .unwrap_or_default();

        Ok(RawJobRecord::new(Self::COMPANY, external_id, &title, &url)?
            .location(location.as_deref())
            .remote(mentions_remote(&text_of(row)))
            .posted_on(scraped_on)
            .salary(salary.min, salary.max, salary.currency.as_deref())
            .raw_html(row.html()))
    }
}
