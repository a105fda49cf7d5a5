use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AdapterCause, ListingSkip};
use crate::models::job_posting::RawJobRecord;
use crate::scraping::adapter::{ScrapeBatch, SiteAdapter};
use crate::scraping::extract::{first_attr, first_text, mentions_remote, resolve_href, selector, text_of};
use crate::scraping::fetcher::PageFetcher;
use crate::utils::{salary::parse_salary_range, time::parse_listing_date};

const OPENINGS_TABLE: &str = "table.openings";

/// Globex renders openings as rows of a single table; rows may carry a
/// `<time datetime>` with the publication date.
pub struct GlobexAdapter {
    fetcher: Arc<dyn PageFetcher>,
    careers_url: String,
}

impl GlobexAdapter {
    pub const COMPANY: &'static str = "Globex";
    pub const CAREERS_URL: &'static str = "https://globex.example.com/careers/openings";

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
    table: Selector,
    row: Selector,
    link: Selector,
    location: Selector,
    posted: Selector,
    compensation: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self, AdapterCause> {
        Ok(Self {
            table: selector(OPENINGS_TABLE)?,
            row: selector("tr.posting")?,
            link: selector("a.posting-link")?,
            location: selector("td.location")?,
            posted: selector("time[datetime]")?,
            compensation: selector("td.compensation")?,
        })
    }
}

#[async_trait]
impl SiteAdapter for GlobexAdapter {
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

        // A missing table means the page layout changed, not that Globex has
        // no openings; failing here keeps existing postings from being closed.
        let table = document
            .select(&selectors.table)
            .next()
            .ok_or_else(|| AdapterCause::MissingRoot(OPENINGS_TABLE.to_string()))?;

        let mut batch = ScrapeBatch::new(Self::COMPANY);
        for row in table.select(&selectors.row) {
            batch.push(
                row.value().attr("data-posting-id"),
                self.parse_row(row, &selectors, scraped_on),
            );
        }
        Ok(batch)
    }
}

impl GlobexAdapter {
    fn parse_row(
        &self,
        row: ElementRef<'_>,
        selectors: &RowSelectors,
        scraped_on: NaiveDate,
    ) -> Result<RawJobRecord, ListingSkip> {
        let external_id = row
            .value()
            .attr("data-posting-id")
            .ok_or(ListingSkip::MissingField("external_id"))?;
        if !external_id.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ListingSkip::MalformedId(external_id.to_string()));
        }

        let title = first_text(row, &selectors.link).ok_or(ListingSkip::MissingField("title"))?;
        let href = first_attr(row, &selectors.link, "href").ok_or(ListingSkip::MissingField("url"))?;
        let url = resolve_href(&self.careers_url, href).ok_or(ListingSkip::MissingField("url"))?;

        let posted = first_attr(row, &selectors.posted, "datetime")
            .and_then(parse_listing_date)
            .unwrap_or(scraped_on);
        let salary = first_text(row, &selectors.compensation)
            .and_then(|text| parse_salary_range(&text))
            .unwrap_or_default();

        Ok(RawJobRecord::new(Self::COMPANY, external_id, &title, &url)?
            .location(first_text(row, &selectors.location).as_deref())
            .remote(mentions_remote(&text_of(row)))
            .posted_on(posted)
            .salary(salary.min, salary.max, salary.currency.as_deref())
            .raw_html(row.html()))
    }
}
