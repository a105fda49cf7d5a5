use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ListingSkip;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub company: String,
    pub external_id: String,
    pub title: String,
    pub url: String,
    pub location_raw: Option<String>,
    pub location_norm: Option<String>,
    pub remote_flag: bool,
    pub date_posted: Option<NaiveDate>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub status: JobStatus,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub currency: Option<String>,
    pub raw_html: Option<String>,
}

/// Posting key: unique across all postings regardless of status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostingKey {
    pub company: String,
    pub external_id: String,
}

impl JobPosting {
    pub fn key(&self) -> PostingKey {
        PostingKey {
            company: self.company.clone(),
            external_id: self.external_id.clone(),
        }
    }

    /// First sighting of a key.
    pub fn from_record(record: &RawJobRecord, seen_at: DateTime<Utc>) -> Self {
        let mut posting = Self {
            id: Uuid::new_v4(),
            company: record.company.clone(),
            external_id: record.external_id.clone(),
            title: String::new(),
            url: String::new(),
            location_raw: None,
            location_norm: None,
            remote_flag: false,
            date_posted: None,
            first_seen: seen_at,
            last_seen: seen_at,
            status: JobStatus::Open,
            salary_min: None,
            salary_max: None,
            currency: None,
            raw_html: None,
        };
        posting.refresh_from(record, seen_at);
        posting
    }

    /// Re-sighting: mutable fields follow the record, `first_seen` stays put.
    pub fn refresh_from(&mut self, record: &RawJobRecord, seen_at: DateTime<Utc>) {
        self.title = record.title.clone();
        self.url = record.url.clone();
        self.location_raw = record.location_raw.clone();
        self.location_norm = record.location_norm.clone();
        self.remote_flag = record.remote_flag;
        self.date_posted = record.date_posted;
        self.salary_min = record.salary_min;
        self.salary_max = record.salary_max;
        self.currency = record.currency.clone();
        self.raw_html = record.raw_html.clone();
        self.last_seen = self.last_seen.max(seen_at);
        self.status = JobStatus::Open;
    }
}

/// Adapter output. Required fields are checked in [`RawJobRecord::new`], so a
/// value of this type is always well-formed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawJobRecord {
    pub company: String,
    pub external_id: String,
    pub title: String,
    pub url: String,
    pub location_raw: Option<String>,
    pub location_norm: Option<String>,
    pub remote_flag: bool,
    pub date_posted: Option<NaiveDate>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub currency: Option<String>,
    pub raw_html: Option<String>,
}

impl RawJobRecord {
    pub fn new(
        company: &str,
        external_id: &str,
        title: &str,
        url: &str,
    ) -> Result<Self, ListingSkip> {
        let company = required(company, "company")?;
        let external_id = required(external_id, "external_id")?;
        if external_id.chars().any(char::is_whitespace) || external_id.len() > 255 {
            return Err(ListingSkip::MalformedId(external_id));
        }

        Ok(Self {
            company,
            external_id,
            title: required(title, "title")?,
            url: required(url, "url")?,
            location_raw: None,
            location_norm: None,
            remote_flag: false,
            date_posted: None,
            salary_min: None,
            salary_max: None,
            currency: None,
            raw_html: None,
        })
    }

    pub fn key(&self) -> PostingKey {
        PostingKey {
            company: self.company.clone(),
            external_id: self.external_id.clone(),
        }
    }

    pub fn location(mut self, location: Option<&str>) -> Self {
        self.location_raw = non_blank(location);
        self
    }

    pub fn remote(mut self, remote: bool) -> Self {
        self.remote_flag = remote;
        self
    }

    pub fn posted_on(mut self, date: NaiveDate) -> Self {
        self.date_posted = Some(date);
        self
    }

    pub fn salary(
        mut self,
        min: Option<Decimal>,
        max: Option<Decimal>,
        currency: Option<&str>,
    ) -> Self {
        self.salary_min = min;
        self.salary_max = max;
        self.currency = currency
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()));
        self
    }

    pub fn raw_html(mut self, html: String) -> Self {
        self.raw_html = Some(html);
        self
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ListingSkip> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ListingSkip::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
